use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "surus")]
#[command(about = "Edit site content locally and publish it to a git host", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Use this config file instead of the default one
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage blog posts
    Blog {
        #[command(subcommand)]
        command: CollectionCommands,
    },

    /// Manage podcast episodes
    Podcast {
        #[command(subcommand)]
        command: CollectionCommands,
    },

    /// Manage team members
    Team {
        #[command(subcommand)]
        command: CollectionCommands,
    },

    /// Manage uploaded media
    Media {
        #[command(subcommand)]
        command: MediaCommands,
    },

    /// Show local storage usage
    Usage,

    /// Show published and draft counts
    Stats,

    /// Export all collections into one snapshot file
    Export {
        /// Output file (prints to stdout if omitted)
        output: Option<PathBuf>,
    },

    /// Restore collections from a snapshot file
    Import {
        /// Snapshot file written by `surus export`
        file: PathBuf,
    },

    /// Import drafts from the site's published JSON documents
    ImportSite {
        /// Directory holding blog.json, podcast.json and team.json
        #[arg(long, default_value = "public/data")]
        dir: PathBuf,
    },

    /// Publish the site documents (or media with --media)
    Publish {
        /// Publish the media index and media files instead
        #[arg(long)]
        media: bool,

        /// Only show what would be published
        #[arg(long)]
        dry_run: bool,
    },

    /// Show or change settings
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },

    /// Delete all local content
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Where a JSON form comes from. Standard input when neither is given.
#[derive(Args, Debug, Clone, Default)]
pub struct FormArgs {
    /// Form as inline JSON
    #[arg(long, conflicts_with = "file")]
    pub data: Option<String>,

    /// Form read from a JSON file
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum CollectionCommands {
    /// List entries
    List {
        /// Print the stored rows as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one entry as JSON
    Show { id: String },

    /// Create an entry from a JSON form
    Add {
        #[command(flatten)]
        form: FormArgs,
    },

    /// Change fields of an entry
    Edit {
        id: String,

        #[command(flatten)]
        form: FormArgs,
    },

    /// Delete an entry
    Rm { id: String },
}

#[derive(Subcommand)]
pub enum MediaCommands {
    /// Upload one or more files
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// List stored files
    List,

    /// Delete a stored file
    Rm { id: String },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current settings
    Show,

    /// Change settings
    Set {
        /// Access token with push permission
        #[arg(long)]
        token: Option<String>,

        /// Repository owner
        #[arg(long)]
        owner: Option<String>,

        /// Repository name
        #[arg(long)]
        repo: Option<String>,

        /// Branch to commit to
        #[arg(long)]
        branch: Option<String>,

        /// API base URL (GitHub Enterprise); empty resets to github.com
        #[arg(long)]
        api_url: Option<String>,

        /// Repository directory for the JSON documents
        #[arg(long)]
        content_dir: Option<String>,

        /// Local storage capacity in characters
        #[arg(long)]
        capacity: Option<usize>,

        /// Directory for documents saved when no repository is configured
        #[arg(long)]
        download_dir: Option<PathBuf>,
    },

    /// Forget the repository settings
    ClearRemote,

    /// Check the token can push to the repository
    Validate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_takes_id_and_inline_form() {
        let cli = Cli::try_parse_from([
            "surus",
            "team",
            "edit",
            "abc",
            "--data",
            r#"{"active": false}"#,
        ])
        .unwrap();
        match cli.command {
            Commands::Team {
                command: CollectionCommands::Edit { id, form },
            } => {
                assert_eq!(id, "abc");
                assert_eq!(form.data.as_deref(), Some(r#"{"active": false}"#));
            }
            _ => panic!("expected team edit"),
        }
    }

    #[test]
    fn test_data_and_file_conflict() {
        let result = Cli::try_parse_from([
            "surus", "blog", "add", "--data", "{}", "--file", "post.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_import_site_default_dir() {
        let cli = Cli::try_parse_from(["surus", "import-site"]).unwrap();
        match cli.command {
            Commands::ImportSite { dir } => assert_eq!(dir, PathBuf::from("public/data")),
            _ => panic!("expected import-site"),
        }
    }

    #[test]
    fn test_media_upload_requires_a_path() {
        assert!(Cli::try_parse_from(["surus", "media", "upload"]).is_err());
    }
}

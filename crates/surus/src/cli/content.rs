//! Collection command handlers

use std::io::Read;

use serde::de::DeserializeOwned;
use surus_core::content::Entity;
use surus_core::id::ContentId;
use surus_core::storage::FileKeyValueStore;
use surus_core::store::Collection;

use crate::cli::args::{CollectionCommands, FormArgs};

/// Handle list/show/add/edit/rm for one collection
pub fn handle_collection_command<T>(
    collection: Collection<'_, FileKeyValueStore, T>,
    command: CollectionCommands,
) -> bool
where
    T: Entity,
    T::Draft: DeserializeOwned,
    T::Patch: DeserializeOwned,
{
    let kind = T::KIND;

    match command {
        CollectionCommands::List { json } => {
            let rows = collection.list();
            if json {
                return print_json(&rows);
            }
            if rows.is_empty() {
                println!("No {} yet.", kind.plural().to_lowercase());
                return true;
            }
            for row in &rows {
                println!("{}  {}", row.id(), row.label());
            }
            true
        }

        CollectionCommands::Show { id } => match collection.get(&ContentId::from(id.as_str())) {
            Some(row) => print_json(&row),
            None => {
                eprintln!("✗ {} not found: {}", kind.singular(), id);
                false
            }
        },

        CollectionCommands::Add { form } => {
            let draft: T::Draft = match read_form(&form) {
                Ok(draft) => draft,
                Err(e) => {
                    eprintln!("✗ Invalid {} form: {}", kind.singular().to_lowercase(), e);
                    return false;
                }
            };
            match collection.create(draft) {
                Ok(row) => {
                    println!("✓ Created {} {}", row.label(), row.id());
                    true
                }
                Err(e) => {
                    eprintln!("✗ {}", e);
                    false
                }
            }
        }

        CollectionCommands::Edit { id, form } => {
            let patch: T::Patch = match read_form(&form) {
                Ok(patch) => patch,
                Err(e) => {
                    eprintln!("✗ Invalid {} form: {}", kind.singular().to_lowercase(), e);
                    return false;
                }
            };
            match collection.update(&ContentId::from(id.as_str()), patch) {
                Ok(row) => {
                    println!("✓ Updated {}", row.label());
                    true
                }
                Err(e) => {
                    eprintln!("✗ {}", e);
                    false
                }
            }
        }

        CollectionCommands::Rm { id } => match collection.delete(&ContentId::from(id.as_str())) {
            Ok(()) => {
                println!("✓ Removed {} {}", kind.singular().to_lowercase(), id);
                true
            }
            Err(e) => {
                eprintln!("✗ {}", e);
                false
            }
        },
    }
}

/// Parse a JSON form from `--data`, `--file`, or stdin.
pub fn read_form<D: DeserializeOwned>(form: &FormArgs) -> Result<D, String> {
    let raw = match (&form.data, &form.file) {
        (Some(data), _) => data.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .map_err(|e| format!("could not read {}: {}", path.display(), e))?,
        (None, None) => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| format!("could not read stdin: {}", e))?;
            buffer
        }
    };
    serde_json::from_str(&raw).map_err(|e| e.to_string())
}

fn print_json<V: serde::Serialize>(value: &V) -> bool {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            true
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use surus_core::content::{NewTeamMember, TeamMemberPatch};

    use super::*;

    #[test]
    fn test_read_inline_draft() {
        let form = FormArgs {
            data: Some(r#"{"name": "Ada", "order": 2}"#.to_string()),
            file: None,
        };
        let draft: NewTeamMember = read_form(&form).unwrap();
        assert_eq!(draft.name, "Ada");
        assert!(draft.active);
    }

    #[test]
    fn test_patch_null_clears_field() {
        let form = FormArgs {
            data: Some(r#"{"image": null}"#.to_string()),
            file: None,
        };
        let patch: TeamMemberPatch = read_form(&form).unwrap();
        assert_eq!(patch.image, Some(None));
        assert!(patch.name.is_none());
    }

    #[test]
    fn test_bad_json_is_reported() {
        let form = FormArgs {
            data: Some("{".to_string()),
            file: None,
        };
        assert!(read_form::<NewTeamMember>(&form).is_err());
    }
}

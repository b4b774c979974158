use crate::collection::Updatable;
use crate::error::{QrError, Result};
use std::env;
use std::fs;
use std::path::Path;
use std::process::Command;
use uuid::Uuid;

/// Gets the editor command from environment.
/// Checks $EDITOR, then $VISUAL, then falls back to common editors.
pub fn get_editor() -> Result<String> {
    for var in ["EDITOR", "VISUAL"] {
        if let Ok(editor) = env::var(var) {
            if !editor.is_empty() {
                return Ok(editor);
            }
        }
    }

    for fallback in &["vim", "vi", "nano"] {
        if Command::new("which")
            .arg(fallback)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
        {
            return Ok((*fallback).to_string());
        }
    }

    Err(QrError::Api(
        "No editor found. Set $EDITOR environment variable.".to_string(),
    ))
}

/// Opens a file in the user's editor and waits for it to close.
/// Returns the contents of the file after editing.
pub fn open_in_editor<P: AsRef<Path>>(file_path: P) -> Result<String> {
    let editor = get_editor()?;
    let path = file_path.as_ref();

    let status = Command::new(&editor)
        .arg(path)
        .status()
        .map_err(|e| QrError::Api(format!("Failed to launch editor '{}': {}", editor, e)))?;

    if !status.success() {
        return Err(QrError::Api(format!(
            "Editor '{}' exited with non-zero status",
            editor
        )));
    }

    fs::read_to_string(path).map_err(QrError::Io)
}

/// Lets the user edit `initial` and returns the result, trailing newlines removed.
pub fn edit_text(initial: &str) -> Result<String> {
    let temp_file = env::temp_dir().join(format!("qrshelf_edit-{}.txt", Uuid::new_v4()));
    fs::write(&temp_file, format!("{}\n", initial)).map_err(QrError::Io)?;

    let result = open_in_editor(&temp_file);
    let _ = fs::remove_file(&temp_file);

    Ok(result?.trim_end_matches(['\n', '\r']).to_string())
}

/// Saving is allowed only for non-blank text that differs from the original.
pub fn can_save(original: &str, edited: &str) -> bool {
    !edited.trim().is_empty() && edited != original
}

/// Applies an edit through the store's update capability. Returns whether it applied.
pub fn apply_edit<U: Updatable + ?Sized>(
    target: &mut U,
    id: Uuid,
    original: &str,
    edited: &str,
) -> bool {
    if !can_save(original, edited) {
        return false;
    }
    target.update(id, edited);
    true
}

/// Opens the editor on an item's text and writes the result back.
pub fn edit_item<U: Updatable + ?Sized>(target: &mut U, id: Uuid, current: &str) -> Result<bool> {
    let edited = edit_text(current)?;
    Ok(apply_edit(target, id, current, &edited))
}

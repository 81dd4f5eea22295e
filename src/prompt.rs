use std::io::{self, BufRead, Write};
use std::path::Path;

const AFFIRMATIVE: &[&str] = &["y", "yes", "yeah"];

pub fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim().to_lowercase();
    AFFIRMATIVE.contains(&answer.as_str())
}

/// Ask before replacing an existing output path. Returns `true` when the path
/// is free or the user agreed to replace it.
pub fn confirm_overwrite<R: BufRead, W: Write>(
    path: &Path,
    input: &mut R,
    output: &mut W,
) -> io::Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    writeln!(
        output,
        "The folder/file {} already exists. Do you wish to send it to the trash? y/n",
        path.display()
    )?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(is_affirmative(&answer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn accepted_answers_ignore_case() {
        for answer in ["y", "Y", "yes", "YES\n", " Yeah "] {
            assert!(is_affirmative(answer), "{answer:?}");
        }
        for answer in ["", "n", "no", "yep", "sure"] {
            assert!(!is_affirmative(answer), "{answer:?}");
        }
    }

    #[test]
    fn missing_path_needs_no_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = Vec::new();
        let ok = confirm_overwrite(&dir.path().join("fresh"), &mut Cursor::new(""), &mut out).unwrap();
        assert!(ok);
        assert!(out.is_empty());
    }

    #[test]
    fn existing_path_asks_and_respects_answer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.txt");
        std::fs::write(&path, "old").unwrap();

        let mut out = Vec::new();
        assert!(confirm_overwrite(&path, &mut Cursor::new("yes\n"), &mut out).unwrap());
        assert!(String::from_utf8(out).unwrap().contains("already exists"));

        let mut out = Vec::new();
        assert!(!confirm_overwrite(&path, &mut Cursor::new("n\n"), &mut out).unwrap());
    }
}

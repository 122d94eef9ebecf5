//! Schema introspection command

use super::load_dataset;
use anyhow::Result;

pub fn run(dataset_path: &str) -> Result<()> {
    let dataset = load_dataset(dataset_path)?;
    print!("{}", dataset.describe());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_dataset_file() {
        assert!(run("/nonexistent/dataset.toml").is_err());
    }

    #[test]
    fn test_loads_dataset_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"name = \"d\"\n[[dimension]]\nname = \"x\"\nsize = 2\n")
            .unwrap();
        let path = file.path().to_string_lossy().to_string();
        assert!(run(&path).is_ok());
    }
}

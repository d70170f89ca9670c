use std::ffi::OsStr;
use std::path::{Path, PathBuf};

pub trait PathExt {
    fn is_toml_file(&self) -> bool;
    fn expanded(&self) -> PathBuf;
}

impl PathExt for Path {
    fn is_toml_file(&self) -> bool {
        self.extension() == Some(OsStr::new("toml"))
    }

    fn expanded(&self) -> PathBuf {
        PathBuf::from(expand_env_vars(self.to_string_lossy().as_ref()))
    }
}

/// Expand `~`, `$VAR` and `${VAR}`; the input is returned unchanged on failure.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_toml_extension_then_is_toml_file() {
        assert!(Path::new("models.toml").is_toml_file());
        assert!(!Path::new("models.json").is_toml_file());
    }

    #[test]
    fn given_unknown_variable_then_input_unchanged() {
        assert_eq!(
            expand_env_vars("$DOMTREE_SURELY_UNSET_VAR/x"),
            "$DOMTREE_SURELY_UNSET_VAR/x"
        );
    }
}

use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Loads raw class files from a single directory.
pub struct BootstrapClassLoader {
    class_path: PathBuf,
}

impl BootstrapClassLoader {
    pub fn new(class_path: impl Into<PathBuf>) -> Self {
        Self {
            class_path: class_path.into(),
        }
    }

    /// Resolves `name` to `<class path>/<name>.class`.
    pub fn class_file(&self, name: &str) -> PathBuf {
        self.class_path.join(format!("{}.class", name))
    }

    /// A `.class` argument is a file path, anything else a class name on the class path.
    pub fn locate(&self, class: &str) -> PathBuf {
        if class.ends_with(".class") {
            PathBuf::from(class)
        } else {
            self.class_file(class)
        }
    }

    pub fn load(&self, class: &str) -> io::Result<Vec<u8>> {
        self.load_file(self.locate(class))
    }

    pub fn load_file(&self, path: impl AsRef<Path>) -> io::Result<Vec<u8>> {
        let path = path.as_ref();
        log::debug!("Loading class file {}", path.display());
        fs::read(path)
    }
}

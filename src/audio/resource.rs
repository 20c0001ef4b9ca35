use std::path::PathBuf;

/// Resolves bundled-resource names to files under a resource directory.
///
/// A name resolves to `<root>/<name>` when that file exists, otherwise to the
/// first existing `<root>/<name>.<ext>` for the configured extensions.
#[derive(Debug, Clone, Default)]
pub struct ResourceResolver {
    root: Option<PathBuf>,
    extensions: Vec<String>,
}

impl ResourceResolver {
    pub fn new(root: Option<PathBuf>, extensions: Vec<String>) -> Self {
        let extensions = extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self { root, extensions }
    }

    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        let root = self.root.as_ref()?;
        let name = name.trim();
        // Names are flat identifiers, never paths.
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return None;
        }

        let direct = root.join(name);
        if direct.is_file() {
            return Some(direct);
        }

        self.extensions
            .iter()
            .map(|ext| root.join(format!("{name}.{ext}")))
            .find(|p| p.is_file())
    }
}

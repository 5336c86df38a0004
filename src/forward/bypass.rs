//! Bypass decision.
//!
//! Server-root and capability-statement requests stay with the local
//! pipeline; everything else is forwarded. Only GET is ever bypassed and
//! paths are compared exactly (no prefix or trailing-slash folding).

/// Set of paths the local pipeline answers for GET requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BypassPolicy {
    paths: Vec<String>,
}

impl BypassPolicy {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut collected: Vec<String> = Vec::new();
        for path in paths {
            let path = path.into();
            if !collected.contains(&path) {
                collected.push(path);
            }
        }
        Self { paths: collected }
    }

    /// Server root, prefix root (with and without slash) and `metadata`.
    pub fn for_prefix(prefix: &str) -> Self {
        Self::new(default_bypass_paths(prefix))
    }

    pub fn should_bypass(&self, method: &str, path: &str) -> bool {
        method.eq_ignore_ascii_case("GET") && self.paths.iter().any(|p| p == path)
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }
}

/// Default bypass list for a path prefix such as `/fhir`.
pub fn default_bypass_paths(prefix: &str) -> Vec<String> {
    let prefix = prefix.trim_end_matches('/');
    let mut paths = vec!["/".to_string()];
    if !prefix.is_empty() {
        paths.push(prefix.to_string());
        paths.push(format!("{prefix}/"));
    }
    paths.push(format!("{prefix}/metadata"));
    paths
}

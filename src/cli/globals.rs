use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct GlobalArgs {
    /// Console hostname used for tenant subdomain auto-selection.
    pub console_host: Option<String>,
    /// Platform base domain the tenant subdomain sits in front of.
    pub base_domain: Option<String>,
    pub state_dir: PathBuf,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(state_dir: PathBuf) -> Self {
        Self {
            console_host: None,
            base_domain: None,
            state_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_args() {
        let args = GlobalArgs::new(PathBuf::from("/tmp/eniri"));
        assert_eq!(args.state_dir, PathBuf::from("/tmp/eniri"));
        assert!(args.console_host.is_none());
        assert!(args.base_domain.is_none());
    }
}

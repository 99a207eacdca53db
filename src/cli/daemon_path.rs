use std::path::PathBuf;

/// Path of the dedicated daemon binary, expected next to the cli executable.
pub fn to_daemon_path(mut path: PathBuf) -> PathBuf {
    path.set_file_name("worktally-daemon");
    #[cfg(windows)]
    {
        path.set_extension("exe");
    }
    path
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::to_daemon_path;

    #[cfg(unix)]
    #[test]
    fn test_daemon_is_a_sibling() {
        assert_eq!(
            to_daemon_path(PathBuf::from("/usr/local/bin/worktally")),
            PathBuf::from("/usr/local/bin/worktally-daemon")
        );
    }
}

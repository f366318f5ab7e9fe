//! Filesystem/mount-point name heuristics for recognizing network storage.

/// True if `fs_type` (as reported by `statfs`/`sysinfo`) names a network filesystem.
pub fn is_network_fs(fs_type: &str) -> bool {
    let fs_type = fs_type.to_ascii_lowercase();
    matches!(
        fs_type.as_str(),
        "nfs" | "nfs4" | "cifs" | "smb" | "smb2" | "smbfs" | "afpfs" | "9p" | "fuse.sshfs" | "webdav"
    ) || fs_type.starts_with("nfs") || fs_type.contains("cifs") || fs_type.contains("smb")
}

/// True if `mount_point` looks like a UNC path (Windows network share).
pub fn is_network_mount(mount_point: &str) -> bool {
    mount_point.starts_with(r"\\") || mount_point.starts_with("//")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_common_network_filesystems() {
        assert!(is_network_fs("nfs"));
        assert!(is_network_fs("cifs"));
        assert!(is_network_fs("smbfs"));
        assert!(!is_network_fs("ext4"));
        assert!(!is_network_fs("apfs"));
    }

    #[test]
    fn recognizes_unc_mounts() {
        assert!(is_network_mount(r"\\server\share"));
        assert!(!is_network_mount("C:\\Users"));
    }
}

//! Free space on the volume hosting a path.

use std::path::{Path, PathBuf};

use sysinfo::Disks;

/// Available bytes on the disk whose mount point is the longest prefix of
/// `path`, or `None` when no mounted disk contains it.
pub fn free_space(path: &Path) -> Option<u64> {
    let target = path
        .canonicalize()
        .unwrap_or_else(|_| path.to_path_buf());
    let disks = Disks::new_with_refreshed_list();
    best_mount(
        &target,
        disks
            .list()
            .iter()
            .map(|d| (d.mount_point().to_path_buf(), d.available_space())),
    )
}

fn best_mount(target: &Path, mounts: impl Iterator<Item = (PathBuf, u64)>) -> Option<u64> {
    mounts
        .filter(|(mount, _)| target.starts_with(mount))
        .max_by_key(|(mount, _)| mount.as_os_str().len())
        .map(|(_, available)| available)
}

//! Output artifact probes for a PetaLinux project.
//!
//! * `boot.scr` is the script read by u-boot at boot time to load the kernel and rootfs.
//! * `image.ub` contains the kernel image, device tree and rootfs.
//! * `BOOT.BIN` packs the firmware stages (FSBL, PMU firmware, TF-A, u-boot).

use std::path::{Path, PathBuf};

/// Directory, relative to the project root, holding the produced images.
pub const IMAGES_SUBDIR: &str = "images/linux";

pub const BOOT_ARTIFACTS: [&str; 2] = ["boot.scr", "image.ub"];

pub const BOOT_IMAGE: &str = "BOOT.BIN";

pub fn images_dir(project_dir: &Path) -> PathBuf {
    project_dir.join(IMAGES_SUBDIR)
}

/// Log and return whether `path` is an existing regular file.
pub fn probe(path: &Path) -> bool {
    log::info!("Checking if {} exists...", path.display());
    if path.is_file() {
        log::info!("{} exists!", path.display());
        true
    } else {
        log::error!("{} does not exist!", path.display());
        false
    }
}

/// Probe every boot artifact and return the missing ones (all of them, not just the first).
pub fn missing_boot_artifacts(project_dir: &Path) -> Vec<PathBuf> {
    let dir = images_dir(project_dir);
    BOOT_ARTIFACTS
        .iter()
        .map(|name| dir.join(name))
        .filter(|path| !probe(path))
        .collect()
}

pub fn boot_image_path(project_dir: &Path) -> PathBuf {
    images_dir(project_dir).join(BOOT_IMAGE)
}

/// First-stage bootloader produced by the build for the given template.
pub fn fsbl_path(project_dir: &Path, template: &str) -> PathBuf {
    images_dir(project_dir).join(format!("{}_fsbl.elf", template))
}

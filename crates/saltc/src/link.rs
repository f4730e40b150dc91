//! Object file linking via system `cc` (spec §4.H "invoke the external
//! linker"), grounded in `mesh-codegen/src/link.rs`'s `cc`-as-linker-
//! driver pattern, adapted from a bundled static runtime (`libmesh_rt.a`)
//! to Salt's platform library list (§6: "unless no-standard-prelude, a
//! platform library list").

use std::path::{Path, PathBuf};
use std::process::Command;

/// Link the accumulated object files into `output_path`. Passes the
/// platform C library list unless `no_std` (spec §6 `--nostd`: "skip
/// prelude and library linking").
pub fn link(objects: &[PathBuf], output_path: &Path, no_std: bool) -> Result<(), String> {
    let mut cmd = Command::new("cc");
    cmd.args(objects).arg("-o").arg(output_path);

    if no_std {
        cmd.arg("-nostdlib");
    } else {
        for lib in platform_libraries() {
            cmd.arg(format!("-l{lib}"));
        }
        #[cfg(target_os = "macos")]
        {
            cmd.arg("-framework").arg("Security");
        }
    }

    tracing::trace!("linker command: {cmd:?}");
    let output = cmd.output().map_err(|e| format!("failed to invoke linker (cc): {e}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("linking failed:\n{stderr}"));
    }

    for object in objects {
        let _ = std::fs::remove_file(object);
    }

    Ok(())
}

/// The platform's default runtime libraries (generalized from the
/// original's Windows-only `"kernel32.lib user32.lib msvcrt.lib"`, which
/// only made sense for `lld-link`; the system `cc` driver on Unix already
/// links `libc` implicitly, but naming it explicitly keeps the two
/// branches symmetric).
fn platform_libraries() -> &'static [&'static str] {
    if cfg!(target_os = "windows") {
        &["kernel32", "user32", "msvcrt"]
    } else {
        &["c", "m"]
    }
}

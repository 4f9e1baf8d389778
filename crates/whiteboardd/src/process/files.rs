use std::io::{self, Write};
use std::path::Path;

use tempfile::Builder;

/// Replaces `path` with `contents` so readers see either the old or the new
/// file, never a partial one. The file is created with mode 0600.
pub(super) fn atomic_write(path: &Path, contents: &[u8]) -> io::Result<()> {
    let Some(directory) = path.parent() else {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("'{}' has no parent directory", path.display()),
        ));
    };
    let prefix = path
        .file_name()
        .map_or_else(|| ".whiteboardd".into(), |name| name.to_string_lossy());

    let mut builder = Builder::new();
    builder.prefix(&*prefix).suffix(".tmp");
    #[cfg(unix)]
    {
        use std::fs::Permissions;
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(Permissions::from_mode(0o600));
    }

    let mut staged = builder.tempfile_in(directory)?;
    staged.write_all(contents)?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|error| error.error)?;
    Ok(())
}

//! Network side of provisioning: release lookup, plugin archives and the
//! installer download.

pub mod archive;
pub mod installer;
pub mod release;
pub mod transport;

pub use archive::{fetch_and_extract, ArchiveError};
pub use installer::{InstallerError, InstallerLauncher, LaunchedInstaller, ProcessLauncher, SystemLauncher};
pub use release::{ReleaseAsset, ReleaseResolver, ResolveError};
pub use transport::{HttpTransport, Transport, TransportError};

//! Seed-file persistence.
//!
//! Carries 32 bytes of entropy across reboots: stored at shutdown with
//! strict permissions, streamed into the kernel's write-entropy device at
//! boot. Host I/O is injected through [`SeedHost`] so tests can drive
//! pathological chunk sizes; the delivered bytes are independent of the
//! chunking used underneath.

use std::io::{self, Read, Write};

use thiserror::Error;
use zeroize::Zeroizing;

/// Size of the persisted seed, in bytes.
pub const SEED_FILE_NBYTES: usize = 32;

/// Required mode bits for the seed file.
pub const SEED_FILE_MODE: u32 = 0o600;

/// Errors from the seed tool, one per failing step.
#[derive(Debug, Error)]
pub enum SeedError {
    /// The seed file could not be opened or created.
    #[error("seed file open: {0}")]
    SeedFileOpen(#[source] io::Error),
    /// Reading the seed file failed mid-stream.
    #[error("seed file read: {0}")]
    SeedFileRead(#[source] io::Error),
    /// Writing the seed file failed.
    #[error("seed file write: {0}")]
    SeedFileWrite(#[source] io::Error),
    /// The entropy device could not be opened.
    #[error("entropy device open: {0}")]
    DeviceOpen(#[source] io::Error),
    /// Writing into the entropy device failed.
    #[error("entropy device write: {0}")]
    DeviceWrite(#[source] io::Error),
    /// Fresh seed material was unavailable.
    #[error("entropy unavailable: {0}")]
    Entropy(#[source] io::Error),
    /// A diagnostic counter could not be read.
    #[error("diagnostics: {0}")]
    Diagnostics(#[source] io::Error),
    /// Hypervisor entropy was unavailable.
    #[error("hypervisor entropy: {0}")]
    Hypervisor(#[source] io::Error),
}

/// Host operations the seed tool depends on.
///
/// The real implementation talks to the filesystem and the OS entropy
/// syscall; tests substitute mocks.
pub trait SeedHost {
    /// Reader over the stored seed file.
    type SeedRead: Read;
    /// Writer creating the seed file with mode 0600, owner 0:0.
    type SeedWrite: Write;
    /// Writer into the kernel entropy device.
    type DeviceWrite: Write;

    /// Opens the seed file for reading.
    fn open_seed(&mut self) -> io::Result<Self::SeedRead>;

    /// Creates (truncating) the seed file with the required permissions
    /// and ownership.
    fn create_seed(&mut self) -> io::Result<Self::SeedWrite>;

    /// Opens the kernel entropy device for writing.
    fn open_device(&mut self) -> io::Result<Self::DeviceWrite>;

    /// Fills `out` with fresh seed material from the running generator.
    fn fresh_seed(&mut self, out: &mut [u8]) -> io::Result<()>;

    /// Reads up to `out.len()` bytes of hypervisor-supplied entropy.
    fn hypervisor_entropy(&mut self, out: &mut [u8]) -> io::Result<usize>;

    /// Reads one named diagnostic counter.
    fn read_counter(&mut self, name: &str) -> io::Result<u64>;
}

/// Streams the entire seed file into the entropy device.
///
/// A missing seed file is reported, not fatal; callers proceed without
/// the carried entropy.
pub fn load_seed<H: SeedHost>(host: &mut H) -> Result<(), SeedError> {
    let mut seed = host.open_seed().map_err(SeedError::SeedFileOpen)?;
    let mut device = host.open_device().map_err(SeedError::DeviceOpen)?;

    let mut buf = Zeroizing::new([0u8; SEED_FILE_NBYTES]);
    let mut total = 0usize;
    loop {
        let nread = seed.read(&mut buf[..]).map_err(SeedError::SeedFileRead)?;
        if nread == 0 {
            tracing::info!(nbytes = total, "seed loaded into entropy device");
            return Ok(());
        }
        device
            .write_all(&buf[..nread])
            .map_err(SeedError::DeviceWrite)?;
        total += nread;
    }
}

/// Writes a fresh 32-byte seed to the seed file.
pub fn store_seed<H: SeedHost>(host: &mut H) -> Result<(), SeedError> {
    let mut buf = Zeroizing::new([0u8; SEED_FILE_NBYTES]);
    host.fresh_seed(&mut buf[..]).map_err(SeedError::Entropy)?;

    let mut file = host.create_seed().map_err(SeedError::SeedFileOpen)?;
    file.write_all(&buf[..]).map_err(SeedError::SeedFileWrite)?;
    file.flush().map_err(SeedError::SeedFileWrite)?;

    tracing::info!("fresh seed stored");
    Ok(())
}

/// Best-effort: pulls up to 32 bytes of hypervisor entropy into the
/// entropy device.
pub fn load_hypervisor_entropy<H: SeedHost>(host: &mut H) -> Result<(), SeedError> {
    let mut buf = Zeroizing::new([0u8; SEED_FILE_NBYTES]);
    let nbytes = host
        .hypervisor_entropy(&mut buf[..])
        .map_err(SeedError::Hypervisor)?;

    let mut device = host.open_device().map_err(SeedError::DeviceOpen)?;
    device
        .write_all(&buf[..nbytes])
        .map_err(SeedError::DeviceWrite)?;

    tracing::info!(nbytes, "hypervisor entropy loaded");
    Ok(())
}

/// Aggregate diagnostic counters printed by the seed tool, in order.
pub const DIAGNOSTIC_COUNTERS: &[&str] = &[
    "prng.user_reseed_count",
    "prng.scheduled_reseed_count",
    "prng.scheduled_reseed_max_sample_count",
    "prng.entropy_max_sample_count",
];

/// Prints the aggregate counters, then the per-pool counters.
pub fn print_diagnostics<H: SeedHost>(host: &mut H) -> Result<(), SeedError> {
    for name in DIAGNOSTIC_COUNTERS {
        let value = host.read_counter(name).map_err(SeedError::Diagnostics)?;
        eprintln!("{name}: {value}");
    }

    for pool in 0..crate::fortuna::NPOOLS {
        for field in ["sample_count", "drain_count", "max_sample_count"] {
            let name = format!("prng.pool{pool}.{field}");
            let value = host.read_counter(&name).map_err(SeedError::Diagnostics)?;
            eprintln!("{name}: {value}");
        }
    }
    Ok(())
}

/// The real host: filesystem seed file, device node, OS entropy.
#[cfg(unix)]
pub struct SystemHost {
    paths: super::config::SeedPaths,
}

#[cfg(unix)]
impl SystemHost {
    /// Creates a host over the configured paths.
    pub fn new(paths: super::config::SeedPaths) -> Self {
        Self { paths }
    }
}

#[cfg(unix)]
impl SeedHost for SystemHost {
    type SeedRead = std::fs::File;
    type SeedWrite = std::fs::File;
    type DeviceWrite = std::fs::File;

    fn open_seed(&mut self) -> io::Result<std::fs::File> {
        std::fs::File::open(&self.paths.seed_file)
    }

    fn create_seed(&mut self) -> io::Result<std::fs::File> {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

        let file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(SEED_FILE_MODE)
            .open(&self.paths.seed_file)?;

        // The open mode is masked by the umask; enforce the exact bits
        // and root ownership afterwards.
        file.set_permissions(std::fs::Permissions::from_mode(SEED_FILE_MODE))?;
        std::os::unix::fs::fchown(&file, Some(0), Some(0))?;
        Ok(file)
    }

    fn open_device(&mut self) -> io::Result<std::fs::File> {
        std::fs::OpenOptions::new()
            .write(true)
            .open(&self.paths.entropy_device)
    }

    fn fresh_seed(&mut self, out: &mut [u8]) -> io::Result<()> {
        getrandom::getrandom(out).map_err(|err| io::Error::new(io::ErrorKind::Other, err))
    }

    fn hypervisor_entropy(&mut self, _out: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }

    fn read_counter(&mut self, _name: &str) -> io::Result<u64> {
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }
}

/*!
# Translatador Platform Resolution

Maps the host operating system and CPU architecture onto the fixed table of
platforms the native translation engine is built for.

Each supported platform carries a classifier that names its bundled artifact:

```text
natives/
  ├── translatador-windows.dll
  ├── translatador-windows-arm64.dll
  ├── libtranslatador-macos.dylib
  ├── libtranslatador-linux.so
  └── libtranslatador-linux-arm64.so
```

## Example

```rust
use translatador_platform::{Arch, Os, Platform};

let platform = Platform::resolve(Os::Linux, Arch::Arm64)?;
assert_eq!(platform.classifier(), "linux-arm64");
assert_eq!(platform.library_file_name("translatador"), "libtranslatador-linux-arm64.so");
# Ok::<(), translatador_platform::PlatformError>(())
```
*/

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("Unrecognized platform: {os}, {arch}")]
    Unsupported { os: String, arch: String },
}

pub type Result<T> = std::result::Result<T, PlatformError>;

/// Operating system families with a native build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    Windows,
    MacOs,
    Linux,
}

impl Os {
    /// Match an OS name as reported by the host (`std::env::consts::OS`, `uname -s`, ...)
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        // "darwin" contains "win", so macOS has to be matched first
        if name.contains("mac") || name.contains("darwin") {
            Some(Self::MacOs)
        } else if name.contains("win") {
            Some(Self::Windows)
        } else if name.contains("linux") || name.contains("unix") {
            Some(Self::Linux)
        } else {
            None
        }
    }

    pub fn library_prefix(&self) -> &'static str {
        match self {
            Self::Windows => "",
            Self::MacOs | Self::Linux => "lib",
        }
    }

    pub fn library_extension(&self) -> &'static str {
        match self {
            Self::Windows => ".dll",
            Self::MacOs => ".dylib",
            Self::Linux => ".so",
        }
    }
}

/// CPU architectures with a native build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    X86,
    X64,
    Arm64,
}

impl Arch {
    /// Match an architecture name as reported by the host (`std::env::consts::ARCH`, `uname -m`, ...)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "x86_64" | "amd64" | "x64" => Some(Self::X64),
            "aarch64" | "arm64" => Some(Self::Arm64),
            "x86" | "i386" | "i586" | "i686" => Some(Self::X86),
            _ => None,
        }
    }
}

/// A supported (OS, architecture) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    Windows,
    WindowsArm64,
    #[serde(rename = "macos")]
    MacOs,
    Linux,
    LinuxArm64,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Windows,
        Platform::WindowsArm64,
        Platform::MacOs,
        Platform::Linux,
        Platform::LinuxArm64,
    ];

    pub fn os(&self) -> Os {
        match self {
            Self::Windows | Self::WindowsArm64 => Os::Windows,
            Self::MacOs => Os::MacOs,
            Self::Linux | Self::LinuxArm64 => Os::Linux,
        }
    }

    pub fn arch(&self) -> Arch {
        match self {
            Self::Windows | Self::MacOs | Self::Linux => Arch::X64,
            Self::WindowsArm64 | Self::LinuxArm64 => Arch::Arm64,
        }
    }

    /// Classifier used to name the bundled artifact for this platform
    pub fn classifier(&self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::WindowsArm64 => "windows-arm64",
            Self::MacOs => "macos",
            Self::Linux => "linux",
            Self::LinuxArm64 => "linux-arm64",
        }
    }

    /// File name of the artifact: `{prefix}{name}-{classifier}{extension}`
    pub fn library_file_name(&self, library_name: &str) -> String {
        let os = self.os();
        format!(
            "{}{}-{}{}",
            os.library_prefix(),
            library_name,
            self.classifier(),
            os.library_extension()
        )
    }

    /// Look up the table entry for an (OS, architecture) pair
    pub fn resolve(os: Os, arch: Arch) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|platform| platform.os() == os && platform.arch() == arch)
            .ok_or_else(|| PlatformError::Unsupported {
                os: format!("{:?}", os),
                arch: format!("{:?}", arch),
            })
    }

    /// Resolve raw OS and architecture names against the table
    pub fn from_names(os_name: &str, arch_name: &str) -> Result<Self> {
        let unsupported = || PlatformError::Unsupported {
            os: os_name.to_string(),
            arch: arch_name.to_string(),
        };
        let os = Os::from_name(os_name).ok_or_else(unsupported)?;
        let arch = Arch::from_name(arch_name).ok_or_else(unsupported)?;
        Self::resolve(os, arch).map_err(|_| unsupported())
    }

    /// Detect the platform of the running process
    pub fn detect() -> Result<Self> {
        let platform = Self::from_names(std::env::consts::OS, std::env::consts::ARCH)?;
        log::debug!(
            "Detected platform {} ({}/{})",
            platform.classifier(),
            std::env::consts::OS,
            std::env::consts::ARCH
        );
        Ok(platform)
    }

    pub fn try_detect() -> Option<Self> {
        Self::detect().ok()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.classifier())
    }
}

/// Whether the running process can use the native engine at all
pub fn is_supported_platform() -> bool {
    Platform::try_detect().is_some()
}

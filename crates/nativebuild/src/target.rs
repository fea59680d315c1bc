//! Target OS / architecture selection and packager script naming.

use std::fmt;
use std::str::FromStr;

use crate::spec::{BuildError, BuildResult};

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Operating system to package for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumBuildOs {
    Win,
    Linux,
    Mac,
    /// Every OS the packager config declares.
    All,
}

impl EnumBuildOs {
    /// Accepted values, in prompt order.
    pub const L_VALUES: [Self; 4] = [Self::Win, Self::Linux, Self::Mac, Self::All];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Win => "win",
            Self::Linux => "linux",
            Self::Mac => "mac",
            Self::All => "all",
        }
    }

    /// OS of the machine running the build.
    pub fn host() -> Self {
        if cfg!(target_os = "windows") {
            Self::Win
        } else if cfg!(target_os = "macos") {
            Self::Mac
        } else {
            Self::Linux
        }
    }

    /// Architectures offered for this OS; empty for [`EnumBuildOs::All`].
    pub fn architectures(self) -> &'static [EnumBuildArch] {
        use EnumBuildArch::{All, Arm64, X64, X86};
        match self {
            Self::Win => &[X64, X86, Arm64, All],
            Self::Mac => &[X86, Arm64, All],
            Self::Linux => &[X64, Arm64, All],
            Self::All => &[],
        }
    }
}

impl fmt::Display for EnumBuildOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnumBuildOs {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::L_VALUES
            .into_iter()
            .find(|os| os.as_str() == value)
            .ok_or_else(|| {
                format!(
                    "Invalid os: `{value}`. Expected one of: ['win', 'linux', 'mac', 'all']"
                )
            })
    }
}

/// Processor architecture to package for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumBuildArch {
    X64,
    X86,
    Arm64,
    All,
}

impl EnumBuildArch {
    pub const L_VALUES: [Self; 4] = [Self::X64, Self::X86, Self::Arm64, Self::All];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::X64 => "x64",
            Self::X86 => "x86",
            Self::Arm64 => "arm64",
            Self::All => "all",
        }
    }
}

impl fmt::Display for EnumBuildArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnumBuildArch {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::L_VALUES
            .into_iter()
            .find(|arch| arch.as_str() == value)
            .ok_or_else(|| {
                format!(
                    "Invalid arch: `{value}`. Expected one of: ['x64', 'x86', 'arm64', 'all']"
                )
            })
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Target

/// Resolved OS plus architecture (`None` only when the OS is `all`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecBuildTarget {
    pub os: EnumBuildOs,
    pub arch: Option<EnumBuildArch>,
}

impl SpecBuildTarget {
    /// Script suffix, e.g. `win-x64`, `mac` (arch `all`) or `all`.
    pub fn suffix(&self) -> String {
        match self.arch {
            Some(arch) if arch != EnumBuildArch::All => format!("{}-{arch}", self.os),
            _ => self.os.to_string(),
        }
    }

    /// `npm run` script for this target.
    ///
    /// Publishing is only offered per OS, so `all` always builds.
    pub fn derive_script_name(&self, if_publish: bool) -> String {
        let c_verb = if if_publish && self.os != EnumBuildOs::All {
            "publish"
        } else {
            "build"
        };
        format!("{c_verb}:{}", self.suffix())
    }
}

impl fmt::Display for SpecBuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.suffix())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Selection

/// Interactive choice between labelled options.
pub trait Selector {
    /// Return the index of the chosen option.
    fn select(&self, label: &str, options: &[&str], index_default: usize) -> BuildResult<usize>;
}

/// Terminal menu backed by `dialoguer`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DialoguerSelector;

impl Selector for DialoguerSelector {
    fn select(&self, label: &str, options: &[&str], index_default: usize) -> BuildResult<usize> {
        dialoguer::Select::new()
            .with_prompt(label)
            .items(options)
            .default(index_default)
            .interact()
            .map_err(|e| BuildError::Prompt(e.to_string()))
    }
}

/// Use `raw` when it names a known OS, otherwise ask (or take the host OS
/// when there is nobody to ask).
pub fn select_os(raw: Option<&str>, selector: Option<&dyn Selector>) -> BuildResult<EnumBuildOs> {
    if let Some(os) = raw.and_then(|v| v.parse::<EnumBuildOs>().ok()) {
        return Ok(os);
    }
    if let Some(value) = raw {
        log::warn!("Unknown os `{value}`");
    }

    let os_default = EnumBuildOs::host();
    let Some(selector) = selector else {
        return Ok(os_default);
    };

    let l_labels = EnumBuildOs::L_VALUES.map(EnumBuildOs::as_str);
    let index_default = EnumBuildOs::L_VALUES
        .iter()
        .position(|os| *os == os_default)
        .unwrap_or(0);
    let index = selector.select(
        "Please select the operating system to build for",
        &l_labels,
        index_default,
    )?;
    EnumBuildOs::L_VALUES
        .get(index)
        .copied()
        .ok_or_else(|| BuildError::Prompt(format!("No option at index {index}")))
}

/// Use `raw` when it is valid for `os`, otherwise ask (or take `all`).
pub fn select_arch_for_os(
    os: EnumBuildOs,
    raw: Option<&str>,
    selector: Option<&dyn Selector>,
) -> BuildResult<EnumBuildArch> {
    let l_archs = os.architectures();
    if let Some(arch) = raw
        .and_then(|v| v.parse::<EnumBuildArch>().ok())
        .filter(|arch| l_archs.contains(arch))
    {
        return Ok(arch);
    }
    if let Some(value) = raw {
        log::warn!("Architecture `{value}` is not available for {os}");
    }

    let Some(selector) = selector else {
        return Ok(EnumBuildArch::All);
    };

    let l_labels = l_archs.iter().map(|a| a.as_str()).collect::<Vec<_>>();
    let index_default = l_archs
        .iter()
        .position(|a| *a == EnumBuildArch::All)
        .unwrap_or(0);
    let index = selector.select(
        "Please select Processor Architecture",
        &l_labels,
        index_default,
    )?;
    l_archs
        .get(index)
        .copied()
        .ok_or_else(|| BuildError::Prompt(format!("No option at index {index}")))
}

/// Resolve both halves of the target; architecture is only asked for a
/// concrete OS.
pub fn select_target(
    raw_os: Option<&str>,
    raw_arch: Option<&str>,
    selector: Option<&dyn Selector>,
) -> BuildResult<SpecBuildTarget> {
    let os = select_os(raw_os, selector)?;
    let arch = match os {
        EnumBuildOs::All => None,
        _ => Some(select_arch_for_os(os, raw_arch, selector)?),
    };
    Ok(SpecBuildTarget { os, arch })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::{
        EnumBuildArch, EnumBuildOs, Selector, SpecBuildTarget, select_arch_for_os, select_os,
        select_target,
    };
    use crate::spec::BuildResult;

    struct FakeSelector {
        index: usize,
        l_seen: RefCell<Vec<Vec<String>>>,
    }

    impl FakeSelector {
        fn new(index: usize) -> Self {
            Self {
                index,
                l_seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Selector for FakeSelector {
        fn select(&self, _label: &str, options: &[&str], _default: usize) -> BuildResult<usize> {
            self.l_seen
                .borrow_mut()
                .push(options.iter().map(|o| o.to_string()).collect());
            Ok(self.index)
        }
    }

    #[test]
    fn parse_os_and_arch() {
        assert_eq!("mac".parse::<EnumBuildOs>(), Ok(EnumBuildOs::Mac));
        assert_eq!("arm64".parse::<EnumBuildArch>(), Ok(EnumBuildArch::Arm64));
        assert!("solaris".parse::<EnumBuildOs>().is_err());
    }

    #[test]
    fn script_name_includes_concrete_arch_only() {
        let target = SpecBuildTarget {
            os: EnumBuildOs::Win,
            arch: Some(EnumBuildArch::X64),
        };
        assert_eq!(target.derive_script_name(false), "build:win-x64");
        assert_eq!(target.derive_script_name(true), "publish:win-x64");

        let target = SpecBuildTarget {
            os: EnumBuildOs::Mac,
            arch: Some(EnumBuildArch::All),
        };
        assert_eq!(target.derive_script_name(false), "build:mac");
    }

    #[test]
    fn publish_is_ignored_for_all() {
        let target = SpecBuildTarget {
            os: EnumBuildOs::All,
            arch: None,
        };
        assert_eq!(target.derive_script_name(true), "build:all");
    }

    #[test]
    fn valid_cli_values_skip_prompt() {
        let selector = FakeSelector::new(0);
        let target = select_target(Some("linux"), Some("arm64"), Some(&selector)).expect("select");
        assert_eq!(target.os, EnumBuildOs::Linux);
        assert_eq!(target.arch, Some(EnumBuildArch::Arm64));
        assert!(selector.l_seen.borrow().is_empty());
    }

    #[test]
    fn arch_not_offered_for_os_prompts() {
        let selector = FakeSelector::new(1);
        let arch =
            select_arch_for_os(EnumBuildOs::Mac, Some("x64"), Some(&selector)).expect("select");
        assert_eq!(arch, EnumBuildArch::Arm64);
        assert_eq!(
            selector.l_seen.borrow()[0],
            vec!["x86".to_string(), "arm64".to_string(), "all".to_string()]
        );
    }

    #[test]
    fn missing_values_fall_back_without_selector() {
        assert_eq!(select_os(None, None).expect("os"), EnumBuildOs::host());
        assert_eq!(
            select_arch_for_os(EnumBuildOs::Win, None, None).expect("arch"),
            EnumBuildArch::All
        );
    }

    #[test]
    fn all_os_never_asks_for_arch() {
        let selector = FakeSelector::new(3);
        let target = select_target(None, None, Some(&selector)).expect("select");
        assert_eq!(target.os, EnumBuildOs::All);
        assert_eq!(target.arch, None);
        assert_eq!(selector.l_seen.borrow().len(), 1);
    }
}

//! Linux hwmon discovery and temperature sampling.
//!
//! Sources are resolved once at startup by their `name` attribute; each tick
//! then reads every `temp*_input` of the resolved sources and keeps the
//! hottest value.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::debug;

use crate::{
    error::{FanError, Result},
    sensors::TemperatureSensor,
};

/// Default sysfs class directory holding `hwmonN` entries.
pub const DEFAULT_HWMON_ROOT: &str = "/sys/class/hwmon";

/// One hwmon directory together with its registered chip name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HwmonSource {
    pub path: PathBuf,
    pub name: String,
}

/// Entry point for resolving logical sensor names to hwmon directories.
///
/// # Example
///
/// ```no_run
/// use fevm_fand::hwmon::HwmonRoot;
///
/// let group = HwmonRoot::default().resolve(&["k10temp".to_string()])?;
/// println!("hottest: {:.1}°C", group.max_temperature()?);
/// # Ok::<(), fevm_fand::error::FanError>(())
/// ```
#[derive(Debug, Clone)]
pub struct HwmonRoot {
    root: PathBuf,
}

impl Default for HwmonRoot {
    fn default() -> Self {
        Self::new(DEFAULT_HWMON_ROOT)
    }
}

impl HwmonRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Lists every readable `hwmon*` entry, ordered by its numeric index.
    ///
    /// Entries without a readable `name` attribute are skipped. A missing
    /// root yields an empty list.
    pub fn sources(&self) -> Vec<HwmonSource> {
        let Ok(entries) = fs::read_dir(&self.root) else {
            debug!("hwmon root {} is not readable", self.root.display());
            return Vec::new();
        };

        let mut sources: Vec<HwmonSource> = entries
            .flatten()
            .filter(|entry| entry.file_name().to_string_lossy().starts_with("hwmon"))
            .filter_map(|entry| {
                let path = entry.path();
                let name = read_trimmed(&path.join("name"))?;
                Some(HwmonSource { path, name })
            })
            .collect();

        sources.sort_by_key(|source| (hwmon_index(&source.path), source.path.clone()));
        sources
    }

    /// Resolves `names` into a deduplicated [`SensorGroup`].
    ///
    /// The hwmon root is scanned once. Matches are ordered by the position of
    /// the name in `names`, then by hwmon index.
    pub fn resolve(&self, names: &[String]) -> Result<SensorGroup> {
        let sources = &self.sources();
        let group = SensorGroup::from_sources(names.iter().flat_map(move |name| {
            sources
                .iter()
                .filter(move |source| source.name == *name)
                .map(|source| source.path.clone())
        }));

        if group.is_empty() {
            return Err(FanError::NotFound {
                names: names.to_vec(),
            });
        }
        Ok(group)
    }
}

/// Ordered, duplicate-free set of hwmon directories sampled together.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SensorGroup {
    sources: Vec<PathBuf>,
}

impl SensorGroup {
    /// Builds a group, keeping the first occurrence of each path.
    pub fn from_sources(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let sources = paths.into_iter().fold(Vec::new(), |mut acc, path| {
            if !acc.contains(&path) {
                acc.push(path);
            }
            acc
        });
        Self { sources }
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Hottest reading across every `temp*_input` of every source, in °C.
    ///
    /// Unreadable directories, files and malformed values are skipped; only
    /// the absence of any parsed value is an error.
    pub fn max_temperature(&self) -> Result<f64> {
        self.sources
            .iter()
            .flat_map(|source| temp_inputs(source))
            .filter_map(|input| match read_millidegrees(&input) {
                Some(celsius) => Some(celsius),
                None => {
                    debug!("skipping unreadable temperature input {}", input.display());
                    None
                }
            })
            .reduce(f64::max)
            .ok_or_else(|| FanError::NoReadableInputs {
                sources: self.sources.clone(),
            })
    }
}

impl TemperatureSensor for SensorGroup {
    fn read_temperature(&self) -> Result<f64> {
        self.max_temperature()
    }

    fn describe(&self) -> String {
        format!("{:?}", self.sources)
    }
}

fn temp_inputs(source: &Path) -> Vec<PathBuf> {
    match fs::read_dir(source) {
        Ok(entries) => entries
            .flatten()
            .filter(|entry| {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                name.starts_with("temp") && name.ends_with("_input")
            })
            .map(|entry| entry.path())
            .collect(),
        Err(e) => {
            debug!("cannot list {}: {e}", source.display());
            Vec::new()
        }
    }
}

fn read_millidegrees(path: &Path) -> Option<f64> {
    let raw = read_trimmed(path)?;
    let millis: i64 = raw.parse().ok()?;
    Some(millis as f64 / 1000.0)
}

fn read_trimmed(path: &Path) -> Option<String> {
    fs::read_to_string(path)
        .ok()
        .map(|raw| raw.trim().to_string())
}

fn hwmon_index(path: &Path) -> u32 {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.strip_prefix("hwmon"))
        .and_then(|idx| idx.parse().ok())
        .unwrap_or(u32::MAX)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    /// Creates `<root>/hwmon<idx>` with a `name` file and the given
    /// `temp<N>_input` contents.
    pub(crate) fn add_hwmon(root: &Path, idx: u32, name: &str, temps: &[&str]) -> PathBuf {
        let dir = root.join(format!("hwmon{idx}"));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("name"), format!("{name}\n")).unwrap();
        for (n, value) in temps.iter().enumerate() {
            fs::write(dir.join(format!("temp{}_input", n + 1)), value).unwrap();
        }
        dir
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn resolves_matching_sources() {
        let tmp = TempDir::new().unwrap();
        let k10 = add_hwmon(tmp.path(), 0, "k10temp", &["45000"]);
        add_hwmon(tmp.path(), 1, "nvme", &["38000"]);

        let group = HwmonRoot::new(tmp.path())
            .resolve(&names(&["k10temp"]))
            .unwrap();

        assert_eq!(group.sources(), &[k10]);
    }

    #[test]
    fn orders_by_name_then_hwmon_index() {
        let tmp = TempDir::new().unwrap();
        let spd_a = add_hwmon(tmp.path(), 10, "spd5118", &["40000"]);
        let k10 = add_hwmon(tmp.path(), 2, "k10temp", &["50000"]);
        let spd_b = add_hwmon(tmp.path(), 3, "spd5118", &["41000"]);

        let group = HwmonRoot::new(tmp.path())
            .resolve(&names(&["spd5118", "k10temp"]))
            .unwrap();

        assert_eq!(group.sources(), &[spd_b, spd_a, k10]);
    }

    #[test]
    fn overlapping_names_yield_each_source_once() {
        let tmp = TempDir::new().unwrap();
        let k10 = add_hwmon(tmp.path(), 0, "k10temp", &["45000"]);
        let spd = add_hwmon(tmp.path(), 1, "spd5118", &["40000"]);

        let group = HwmonRoot::new(tmp.path())
            .resolve(&names(&["k10temp", "spd5118", "k10temp", "missing"]))
            .unwrap();

        assert_eq!(group.sources(), &[k10, spd]);
    }

    #[test]
    fn unmatched_names_are_not_found() {
        let tmp = TempDir::new().unwrap();
        add_hwmon(tmp.path(), 0, "nvme", &["38000"]);

        let err = HwmonRoot::new(tmp.path())
            .resolve(&names(&["spd5118"]))
            .unwrap_err();

        assert!(matches!(err, FanError::NotFound { ref names } if names == &["spd5118"]));
    }

    #[test]
    fn missing_root_resolves_nothing() {
        let tmp = TempDir::new().unwrap();
        let root = HwmonRoot::new(tmp.path().join("absent"));

        assert!(root.sources().is_empty());
        assert!(root.resolve(&names(&["k10temp"])).is_err());
    }

    #[test]
    fn sources_without_name_are_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("hwmon0")).unwrap();
        add_hwmon(tmp.path(), 1, "k10temp", &[]);

        let sources = HwmonRoot::new(tmp.path()).sources();

        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name, "k10temp");
    }

    #[test]
    fn max_temperature_takes_hottest_input() {
        let tmp = TempDir::new().unwrap();
        let a = add_hwmon(tmp.path(), 0, "k10temp", &["45000", "61250\n"]);
        let b = add_hwmon(tmp.path(), 1, "k10temp", &["58000"]);

        let group = SensorGroup::from_sources([a, b]);

        assert_eq!(group.max_temperature().unwrap(), 61.25);
    }

    #[test]
    fn malformed_inputs_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let dir = add_hwmon(tmp.path(), 0, "k10temp", &["garbage", "", "52000"]);

        let group = SensorGroup::from_sources([dir]);

        assert_eq!(group.max_temperature().unwrap(), 52.0);
    }

    #[test]
    fn non_input_files_are_ignored() {
        let tmp = TempDir::new().unwrap();
        let dir = add_hwmon(tmp.path(), 0, "k10temp", &["40000"]);
        fs::write(dir.join("temp1_crit"), "95000").unwrap();
        fs::write(dir.join("temp1_label"), "Tctl").unwrap();

        let group = SensorGroup::from_sources([dir]);

        assert_eq!(group.max_temperature().unwrap(), 40.0);
    }

    #[test]
    fn no_readable_inputs_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let dir = add_hwmon(tmp.path(), 0, "k10temp", &["n/a"]);
        let gone = tmp.path().join("hwmon9");

        let group = SensorGroup::from_sources([dir, gone]);
        let err = group.max_temperature().unwrap_err();

        assert!(matches!(err, FanError::NoReadableInputs { ref sources } if sources.len() == 2));
        assert!(err.is_recoverable());
    }

    #[test]
    fn negative_readings_parse() {
        let tmp = TempDir::new().unwrap();
        let dir = add_hwmon(tmp.path(), 0, "acpitz", &["-5000"]);

        let group = SensorGroup::from_sources([dir]);

        assert_eq!(group.read_temperature().unwrap(), -5.0);
    }

    #[test]
    fn from_sources_keeps_first_occurrence() {
        let group = SensorGroup::from_sources(
            ["/a", "/b", "/a", "/c", "/b"].into_iter().map(PathBuf::from),
        );

        assert_eq!(
            group.sources(),
            &[PathBuf::from("/a"), PathBuf::from("/b"), PathBuf::from("/c")]
        );
    }
}

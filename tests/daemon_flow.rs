use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use fevm_fand::{
    application::Application,
    config::Config,
    control_loop::LoopState,
    error::FanError,
    hwmon::HwmonRoot,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

struct Rig {
    tmp: TempDir,
}

impl Rig {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("hwmon")).unwrap();
        fs::create_dir_all(tmp.path().join("fevm-ip3-wmi")).unwrap();
        Self { tmp }
    }

    fn hwmon_root(&self) -> HwmonRoot {
        HwmonRoot::new(self.tmp.path().join("hwmon"))
    }

    fn add_sensor(&self, idx: u32, name: &str, temp: &str) -> PathBuf {
        let dir = self.tmp.path().join("hwmon").join(format!("hwmon{idx}"));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("name"), format!("{name}\n")).unwrap();
        fs::write(dir.join("temp1_input"), temp).unwrap();
        dir
    }

    fn fan(&self, n: u8) -> PathBuf {
        self.tmp
            .path()
            .join("fevm-ip3-wmi")
            .join(format!("fan{n}_duty"))
    }

    fn config(&self) -> Config {
        let mut config = Config::default();
        config.general.fan1_path = self.fan(1);
        config.general.fan2_path = self.fan(2);
        config
    }

    fn app(&self, config: Config) -> Result<Application, FanError> {
        Application::builder()
            .with_config(config)
            .with_hwmon_root(self.hwmon_root())
            .build()
    }
}

fn duty(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[tokio::test(start_paused = true)]
async fn drives_both_fans_from_their_sensors() {
    let rig = Rig::new();
    let cpu = rig.add_sensor(0, "k10temp", "55000");
    rig.add_sensor(1, "spd5118", "45000");
    let app = rig.app(rig.config()).unwrap();

    let token = CancellationToken::new();
    let handle = tokio::spawn(app.run(token.clone()));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(duty(&rig.fan(1)), "35");
    assert_eq!(duty(&rig.fan(2)), "33");

    fs::write(cpu.join("temp1_input"), "85000").unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(duty(&rig.fan(1)), "100");
    assert_eq!(duty(&rig.fan(2)), "33");

    token.cancel();
    assert_eq!(handle.await.unwrap(), LoopState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn memory_channel_follows_cpu_without_dimm_sensor() {
    let rig = Rig::new();
    rig.add_sensor(0, "k10temp", "55000");
    let app = rig.app(rig.config()).unwrap();

    let token = CancellationToken::new();
    let handle = tokio::spawn(app.run(token.clone()));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(duty(&rig.fan(1)), "35");
    assert_eq!(duty(&rig.fan(2)), "50");

    token.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn unreadable_sensor_forces_failsafe_on_every_fan() {
    let rig = Rig::new();
    rig.add_sensor(0, "k10temp", "55000");
    let mem = rig.add_sensor(1, "spd5118", "45000");
    let app = rig.app(rig.config()).unwrap();

    let token = CancellationToken::new();
    let handle = tokio::spawn(app.run(token.clone()));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(duty(&rig.fan(2)), "33");

    fs::write(mem.join("temp1_input"), "not a number").unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(duty(&rig.fan(1)), "70");
    assert_eq!(duty(&rig.fan(2)), "70");

    fs::write(mem.join("temp1_input"), "45000").unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(duty(&rig.fan(1)), "35");
    assert_eq!(duty(&rig.fan(2)), "33");

    token.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn cancelled_before_start_writes_nothing() {
    let rig = Rig::new();
    rig.add_sensor(0, "k10temp", "55000");
    let app = rig.app(rig.config()).unwrap();

    let token = CancellationToken::new();
    token.cancel();

    assert_eq!(app.run(token).await, LoopState::Stopped);
    assert!(!rig.fan(1).exists());
    assert!(!rig.fan(2).exists());
}

#[test]
fn missing_cpu_sensor_aborts_startup() {
    let rig = Rig::new();
    rig.add_sensor(0, "spd5118", "45000");

    let err = rig.app(rig.config()).unwrap_err();

    assert!(matches!(err, FanError::NotFound { .. }));
}

#[test]
fn yaml_config_overrides_defaults() {
    let rig = Rig::new();
    rig.add_sensor(0, "coretemp", "60000");
    let path = rig.tmp.path().join("config.yml");
    fs::write(
        &path,
        format!(
            "version: 1\n\
             general:\n  fan1_path: {}\n  fan2_path: {}\n  poll_sec: 0.5\n  min_duty: 30\n\
             sensors:\n  cpu_names: [coretemp]\n",
            rig.fan(1).display(),
            rig.fan(2).display()
        ),
    )
    .unwrap();

    let config = Config::load(Some(path)).unwrap();
    let app = rig.app(config).unwrap();

    assert_eq!(app.control_loop().poll_interval(), Duration::from_millis(500));
    assert_eq!(app.control_loop().channels().len(), 2);
}

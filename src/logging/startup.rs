use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;

/// One INFO event describing a service at startup: crate version,
/// executable path, start time and any configs it was launched with.
///
/// Configs are keyed by their short type name. `Duration` values, which
/// serde writes as `{secs, nanos}`, are rendered as strings like `"1.5s"`.
///
/// ```
/// use svckit::config::LogStdConfig;
/// use svckit::logging::StartupInfo;
///
/// StartupInfo::new("collector")
///     .config(&LogStdConfig::default())
///     .log();
/// ```
#[derive(Debug, Clone)]
pub struct StartupInfo {
    app_name: String,
    configs: Map<String, Value>,
}

impl StartupInfo {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            configs: Map::new(),
        }
    }

    /// Attach a config struct under its type name.
    pub fn config<C: Serialize>(mut self, cfg: &C) -> Self {
        let value = match serde_json::to_value(cfg) {
            Ok(v) => sanitize(v),
            Err(e) => Value::String(format!("<unserializable: {}>", e)),
        };
        self.configs.insert(short_type_name::<C>().to_string(), value);
        self
    }

    pub fn configs(&self) -> &Map<String, Value> {
        &self.configs
    }

    pub fn log(&self) {
        let executable = match std::env::current_exe() {
            Ok(path) => path.display().to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "Could not determine executable path");
                "unknown".to_string()
            }
        };
        let configs = Value::Object(self.configs.clone());

        tracing::info!(
            crate_version = env!("CARGO_PKG_VERSION"),
            executable = %executable,
            start_time = %chrono::Utc::now().to_rfc3339(),
            configs = %configs,
            "{} started",
            self.app_name
        );
    }
}

/// `svckit::config::LogStdConfig` -> `LogStdConfig`, generics dropped.
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

fn sanitize(value: Value) -> Value {
    match value {
        Value::Object(map) => match as_duration(&map) {
            Some(d) => Value::String(format!("{:?}", d)),
            None => Value::Object(map.into_iter().map(|(k, v)| (k, sanitize(v))).collect()),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize).collect()),
        other => other,
    }
}

fn as_duration(map: &Map<String, Value>) -> Option<Duration> {
    if map.len() != 2 {
        return None;
    }
    let secs = map.get("secs")?.as_u64()?;
    let nanos = u32::try_from(map.get("nanos")?.as_u64()?).ok()?;
    Some(Duration::new(secs, nanos))
}

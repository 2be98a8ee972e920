use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::clipboard::ClipboardConfig;
use crate::error::AppError;
use crate::raster::{ImageSource, RasterConfig};

const DEFAULT_SWATCH_SIZE: f64 = 50.0;

/// 取色器设置，持久化为 JSON 文件。缺省字段回落到默认值。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerSettings {
    pub raster: RasterConfig,
    pub clipboard: ClipboardConfig,
    /// 跟随光标色块的边长（像素）。
    pub swatch_size: f64,
    /// 启动时加载的图片（路径、URL 或 data URL）。
    pub bootstrap_image: Option<String>,
}

impl Default for PickerSettings {
    fn default() -> Self {
        Self {
            raster: RasterConfig::default(),
            clipboard: ClipboardConfig::default(),
            swatch_size: DEFAULT_SWATCH_SIZE,
            bootstrap_image: None,
        }
    }
}

impl PickerSettings {
    pub fn validate(&self) -> Result<(), AppError> {
        self.raster
            .validate()
            .map_err(|e| AppError::Settings(format!("raster: {}", e)))?;
        self.clipboard
            .validate()
            .map_err(|e| AppError::Settings(format!("clipboard: {}", e)))?;

        if !self.swatch_size.is_finite() || self.swatch_size <= 0.0 {
            return Err(AppError::Settings("swatch_size 必须为正数".to_string()));
        }
        if matches!(&self.bootstrap_image, Some(s) if s.trim().is_empty()) {
            return Err(AppError::Settings("bootstrap_image 不能为空字符串".to_string()));
        }

        Ok(())
    }

    /// 启动图片对应的来源。
    pub fn bootstrap_source(&self) -> Option<ImageSource> {
        self.bootstrap_image.as_deref().map(ImageSource::infer)
    }

    /// 从文件读取设置；文件不存在时返回默认设置。
    pub fn load_from_path(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            log::info!("⚙️ 设置文件不存在，使用默认设置: {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let parsed = serde_json::from_str::<Self>(&content)
            .map_err(|e| AppError::Settings(format!("解析设置文件失败: {}", e)))?;
        parsed.validate()?;

        Ok(parsed)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), AppError> {
        self.validate()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Settings(format!("序列化设置失败: {}", e)))?;

        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        std::env::temp_dir()
            .join(format!("pixel-picker-settings-{}-{}", std::process::id(), nanos))
            .join(name)
    }

    #[test]
    fn missing_file_yields_defaults() {
        let settings = PickerSettings::load_from_path(&temp_path("absent.json")).expect("load");

        assert_eq!(settings, PickerSettings::default());
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let path = temp_path("partial.json");
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(&path, r#"{"swatch_size": 80.0, "clipboard": {"retries": 5}}"#).expect("write");

        let settings = PickerSettings::load_from_path(&path).expect("load");

        assert_eq!(settings.swatch_size, 80.0);
        assert_eq!(settings.clipboard.retries, 5);
        assert_eq!(settings.clipboard.retry_delay_ms, 100);
        assert_eq!(settings.raster, RasterConfig::default());
    }

    #[test]
    fn save_then_load_preserves_values() {
        let path = temp_path("nested/settings.json");
        let settings = PickerSettings {
            bootstrap_image: Some("sample.png".to_string()),
            ..PickerSettings::default()
        };

        settings.save_to_path(&path).expect("save");
        let loaded = PickerSettings::load_from_path(&path).expect("load");

        assert_eq!(loaded, settings);
        assert_eq!(
            loaded.bootstrap_source(),
            Some(ImageSource::FilePath("sample.png".to_string()))
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        let path = temp_path("invalid.json");
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(&path, r#"{"swatch_size": -1.0}"#).expect("write");

        assert!(matches!(
            PickerSettings::load_from_path(&path),
            Err(AppError::Settings(_))
        ));
    }

    #[test]
    fn malformed_json_is_settings_error() {
        let path = temp_path("broken.json");
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(&path, "{not json").expect("write");

        assert!(matches!(
            PickerSettings::load_from_path(&path),
            Err(AppError::Settings(_))
        ));
    }
}

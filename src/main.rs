//! # 图片取色器 — 命令行入口
//!
//! 以原始分辨率加载一张图片并读取某个像素：
//!
//! ```text
//! pixel-picker <图片路径|URL|data URL> <x> <y> [hex|rgb]
//! ```
//!
//! 指定 `hex` 或 `rgb` 时额外复制到系统剪贴板。设置文件路径由
//! `PIXEL_PICKER_SETTINGS` 指定，缺省使用默认设置。

use std::path::PathBuf;
use std::process::ExitCode;

use pixel_picker::controller::{CopyTarget, PickerController, PickerEvent, UiUpdate};
use pixel_picker::pointer::{DisplayRect, ViewportPoint};
use pixel_picker::raster::ImageSource;
use pixel_picker::settings::PickerSettings;

const USAGE: &str = "用法: pixel-picker <图片> <x> <y> [hex|rgb]";

#[tokio::main]
async fn main() -> ExitCode {
    pixel_picker::init_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (Some(reference), Some(x), Some(y)) = (args.first(), args.get(1), args.get(2)) else {
        eprintln!("{}", USAGE);
        return ExitCode::from(2);
    };
    let (Ok(x), Ok(y)) = (x.parse::<u32>(), y.parse::<u32>()) else {
        eprintln!("坐标必须为非负整数\n{}", USAGE);
        return ExitCode::from(2);
    };
    let copy_target = match args.get(3).map(String::as_str) {
        None => None,
        Some("hex") => Some(CopyTarget::Hex),
        Some("rgb") => Some(CopyTarget::Rgb),
        Some(other) => {
            eprintln!("未知复制格式: {}\n{}", other, USAGE);
            return ExitCode::from(2);
        }
    };

    let settings = match std::env::var_os("PIXEL_PICKER_SETTINGS") {
        Some(path) => PickerSettings::load_from_path(&PathBuf::from(path)),
        None => Ok(PickerSettings::default()),
    };
    let controller = match settings.and_then(PickerController::with_system_clipboard) {
        Ok(controller) => controller,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut events = vec![PickerEvent::LoadImage(ImageSource::infer(reference))];
    let loaded = run(&controller, events.drain(..)).await;
    let Some((width, height)) = loaded.iter().find_map(|u| match u {
        UiUpdate::ImageReplaced { width, height } => Some((*width, *height)),
        _ => None,
    }) else {
        return ExitCode::FAILURE;
    };

    // 以原始尺寸"显示"，像素中心即视口坐标
    let rect = DisplayRect::new(0.0, 0.0, width as f64, height as f64);
    let point = ViewportPoint::new(x as f64 + 0.5, y as f64 + 0.5);
    events.push(PickerEvent::PointerClick { point, rect });
    events.extend(copy_target.map(PickerEvent::Copy));

    let updates = run(&controller, events.drain(..)).await;
    if !updates.iter().any(|u| matches!(u, UiUpdate::ColorPicked(_))) {
        eprintln!("坐标 ({}, {}) 超出图片范围 {}x{}", x, y, width, height);
        return ExitCode::FAILURE;
    }

    if updates.iter().any(|u| matches!(u, UiUpdate::Failed(_))) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// 依次处理事件并打印更新。
async fn run(
    controller: &PickerController,
    events: impl Iterator<Item = PickerEvent>,
) -> Vec<UiUpdate> {
    let mut all = Vec::new();
    for event in events {
        for update in controller.handle_event(event).await {
            match &update {
                UiUpdate::ImageReplaced { width, height } => println!("图片: {}x{}", width, height),
                UiUpdate::ColorPicked(picked) => println!("{}\n{}", picked.hex, picked.rgb),
                UiUpdate::Copied { text } => println!("已复制: {}", text),
                UiUpdate::Failed(payload) => eprintln!("[{}] {}", payload.code, payload.message),
                UiUpdate::SwatchMoved { .. } | UiUpdate::SwatchHidden => {}
            }
            all.push(update);
        }
    }
    all
}

//! 指针坐标映射模块
//!
//! 将视口坐标（指针事件的 `client_x/client_y`）换算为原图像素网格坐标。
//!
//! # 设计思路
//!
//! - 纯函数化：输入为视口点、显示区域与原图尺寸，输出唯一网格坐标，便于测试。
//! - 只做仿射变换，不做越界判断。越界由 `RasterImage::sample` 返回 `None` 处理，
//!   因此"光标在边缘"是正常路径而不是异常路径。
//! - 显示区域退化（零/负宽高、NaN）时返回必定越界的坐标，避免除零与 NaN 截断。

use serde::{Deserialize, Serialize};

/// 指针事件在视口中的位置。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportPoint {
    pub client_x: f64,
    pub client_y: f64,
}

impl ViewportPoint {
    pub const fn new(client_x: f64, client_y: f64) -> Self {
        Self { client_x, client_y }
    }
}

/// 图片在视口中的显示区域（等价于 `getBoundingClientRect`）。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl DisplayRect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }

    /// 指针是否位于显示区域内（右/下边界不含）。
    pub fn contains(&self, point: ViewportPoint) -> bool {
        if self.is_degenerate() {
            return false;
        }

        let dx = point.client_x - self.left;
        let dy = point.client_y - self.top;
        dx >= 0.0 && dy >= 0.0 && dx < self.width && dy < self.height
    }
}

/// 原图像素网格坐标，可能为负或超出图片尺寸。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct GridPoint {
    pub x: i64,
    pub y: i64,
}

/// 退化显示区域的映射结果，任何图片都不包含该点。
const OUT_OF_GRID: GridPoint = GridPoint { x: -1, y: -1 };

/// 视口坐标 → 原图网格坐标。
///
/// `x = floor((client_x - left) * native_width / width)`，`y` 同理。
///
/// # 示例
/// ```
/// use pixel_picker::pointer::{map_to_grid, DisplayRect, ViewportPoint};
///
/// let rect = DisplayRect::new(10.0, 20.0, 100.0, 50.0);
/// let p = map_to_grid(ViewportPoint::new(60.0, 45.0), rect, 200, 100);
/// assert_eq!((p.x, p.y), (100, 50));
/// ```
pub fn map_to_grid(
    point: ViewportPoint,
    rect: DisplayRect,
    native_width: u32,
    native_height: u32,
) -> GridPoint {
    if rect.is_degenerate() {
        return OUT_OF_GRID;
    }

    let scale_x = native_width as f64 / rect.width;
    let scale_y = native_height as f64 / rect.height;

    let x = ((point.client_x - rect.left) * scale_x).floor();
    let y = ((point.client_y - rect.top) * scale_y).floor();

    if !x.is_finite() || !y.is_finite() {
        return OUT_OF_GRID;
    }

    // `as` 对超范围浮点做饱和截断，结果仍会被越界检查拒绝
    GridPoint {
        x: x as i64,
        y: y as i64,
    }
}

/// 跟随光标的色块左上角位置。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SwatchPlacement {
    pub left: f64,
    pub top: f64,
}

/// 计算色块位置：色块中心对齐光标。
pub fn swatch_placement(point: ViewportPoint, width: f64, height: f64) -> SwatchPlacement {
    SwatchPlacement {
        left: point.client_x - width / 2.0,
        top: point.client_y - height / 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_edge_maps_to_zero() {
        let rect = DisplayRect::new(40.0, 0.0, 100.0, 100.0);
        let p = map_to_grid(ViewportPoint::new(40.0, 0.0), rect, 200, 200);

        assert_eq!(p, GridPoint { x: 0, y: 0 });
    }

    #[test]
    fn right_edge_maps_to_native_width() {
        let rect = DisplayRect::new(40.0, 0.0, 100.0, 100.0);
        let p = map_to_grid(ViewportPoint::new(140.0, 99.9), rect, 200, 200);

        assert_eq!(p.x, 200);
        assert_eq!(p.y, 199);
    }

    #[test]
    fn upscaled_display_floors_into_native_cells() {
        // 2x2 原图显示为 200x200，每个原图像素占 100 视口像素
        let rect = DisplayRect::new(0.0, 0.0, 200.0, 200.0);

        assert_eq!(map_to_grid(ViewportPoint::new(99.99, 0.0), rect, 2, 2).x, 0);
        assert_eq!(map_to_grid(ViewportPoint::new(100.0, 0.0), rect, 2, 2).x, 1);
        assert_eq!(map_to_grid(ViewportPoint::new(150.0, 150.0), rect, 2, 2), GridPoint { x: 1, y: 1 });
    }

    #[test]
    fn pointer_left_of_rect_maps_negative() {
        let rect = DisplayRect::new(10.0, 10.0, 100.0, 100.0);
        let p = map_to_grid(ViewportPoint::new(9.5, 5.0), rect, 100, 100);

        assert_eq!(p, GridPoint { x: -1, y: -5 });
    }

    #[test]
    fn degenerate_rect_maps_out_of_grid() {
        let point = ViewportPoint::new(1.0, 1.0);

        assert_eq!(map_to_grid(point, DisplayRect::new(0.0, 0.0, 0.0, 10.0), 10, 10), OUT_OF_GRID);
        assert_eq!(map_to_grid(point, DisplayRect::new(0.0, 0.0, 10.0, -3.0), 10, 10), OUT_OF_GRID);
        assert_eq!(map_to_grid(point, DisplayRect::new(0.0, 0.0, f64::NAN, 10.0), 10, 10), OUT_OF_GRID);
    }

    #[test]
    fn non_finite_pointer_maps_out_of_grid() {
        let rect = DisplayRect::new(0.0, 0.0, 10.0, 10.0);

        assert_eq!(map_to_grid(ViewportPoint::new(f64::NAN, 1.0), rect, 10, 10), OUT_OF_GRID);
    }

    #[test]
    fn contains_excludes_far_edges() {
        let rect = DisplayRect::new(10.0, 10.0, 100.0, 50.0);

        assert!(rect.contains(ViewportPoint::new(10.0, 10.0)));
        assert!(rect.contains(ViewportPoint::new(109.9, 59.9)));
        assert!(!rect.contains(ViewportPoint::new(110.0, 20.0)));
        assert!(!rect.contains(ViewportPoint::new(20.0, 60.0)));
        assert!(!rect.contains(ViewportPoint::new(9.0, 20.0)));
    }

    #[test]
    fn swatch_is_centered_on_cursor() {
        let placement = swatch_placement(ViewportPoint::new(300.0, 200.0), 50.0, 40.0);

        assert_eq!(placement, SwatchPlacement { left: 275.0, top: 180.0 });
    }
}

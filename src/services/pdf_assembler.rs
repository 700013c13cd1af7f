//! PDF 组装 - 业务能力层
//!
//! 按页码下载预览图片（Semaphore 限制并发），下载完成后按页码排序，
//! 每页的尺寸由图片像素和 DPI 决定，最后一次性写出 PDF。
//!
//! - 单页下载失败只记录日志并跳过该页
//! - 一页都没下载成功时视为失败
//! - 先写 `{name}.pdf.part`，完成后再重命名，中断时不会留下 `.pdf`

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use image::DynamicImage;
use printpdf::{Image, ImageTransform, Mm, PdfDocument, Pt};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::error::{AppError, AppResult, AssemblyError};
use crate::infrastructure::PageFetcher;
use crate::models::PageImageMap;
use crate::utils::sanitize_file_name;

/// 图片未声明分辨率时使用的 DPI
pub const DEFAULT_DPI: f32 = 72.0;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// 组装结果
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyReport {
    pub output: PathBuf,
    pub pages_written: usize,
    /// 下载或解码失败、未写入的页码
    pub pages_missing: Vec<u32>,
}

/// 已下载到临时目录的页面
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedPage {
    pub page: u32,
    pub path: PathBuf,
}

struct DecodedPage {
    page: u32,
    image: DynamicImage,
    dpi: f32,
}

/// 并发下载图片并组装为 PDF
pub struct PdfAssembler {
    fetcher: Arc<dyn PageFetcher>,
    concurrency: usize,
    output_dir: PathBuf,
}

impl PdfAssembler {
    pub fn new(fetcher: Arc<dyn PageFetcher>, concurrency: usize, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            concurrency: concurrency.max(1),
            output_dir: output_dir.into(),
        }
    }

    /// 下载所有页面并写出 `{output_dir}/{name}.pdf`
    pub async fn assemble(&self, pages: &PageImageMap, name: &str) -> AppResult<AssemblyReport> {
        if pages.is_empty() {
            return Err(AssemblyError::NoPages { name: name.to_string() }.into());
        }

        let scratch = tempfile::TempDir::new()
            .map_err(|e| AppError::write_failed("临时目录", e))?;

        info!("⬇️ 开始下载 {} ({} 页, 并发 {})", name, pages.len(), self.concurrency);
        let downloaded = self.download_pages(pages, scratch.path()).await;

        let mut decoded = Vec::with_capacity(downloaded.len());
        for item in &downloaded {
            match decode_page(item).await {
                Ok(page) => decoded.push(page),
                Err(e) => warn!("⚠️ {}", e),
            }
        }

        if decoded.is_empty() {
            return Err(AssemblyError::NoPages { name: name.to_string() }.into());
        }

        let written: Vec<u32> = decoded.iter().map(|p| p.page).collect();
        let pages_missing: Vec<u32> = pages
            .keys()
            .copied()
            .filter(|page| !written.contains(page))
            .collect();

        std::fs::create_dir_all(&self.output_dir)
            .map_err(|e| AppError::write_failed(self.output_dir.display().to_string(), e))?;
        let file_stem = sanitize_file_name(name);
        let output = self.output_dir.join(format!("{}.pdf", file_stem));
        let partial = self.output_dir.join(format!("{}.pdf.part", file_stem));

        let title = name.to_string();
        let target = partial.clone();
        let pages_written = decoded.len();
        let result = tokio::task::spawn_blocking(move || write_pdf(&title, decoded, &target))
            .await
            .map_err(|e| AssemblyError::PdfWrite {
                path: partial.display().to_string(),
                message: e.to_string(),
            })?;

        if let Err(e) = result {
            let _ = std::fs::remove_file(&partial);
            return Err(e);
        }

        std::fs::rename(&partial, &output)
            .map_err(|e| AppError::write_failed(output.display().to_string(), e))?;

        if pages_missing.is_empty() {
            info!("✅ 已生成 {} ({} 页)", output.display(), pages_written);
        } else {
            warn!(
                "⚠️ 已生成 {} ({} 页)，缺少第 {:?} 页",
                output.display(),
                pages_written,
                pages_missing
            );
        }

        Ok(AssemblyReport {
            output,
            pages_written,
            pages_missing,
        })
    }

    /// 并发下载所有页面到 `scratch`，返回成功的页面（按页码升序）
    pub async fn download_pages(&self, pages: &PageImageMap, scratch: &Path) -> Vec<DownloadedPage> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::with_capacity(pages.len());

        for (&page, url) in pages {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!("❌ 下载队列已关闭: {}", e);
                    break;
                }
            };

            let fetcher = self.fetcher.clone();
            let url = url.clone();
            let path = scratch.join(format!("page_{:05}.img", page));

            let handle = tokio::spawn(async move {
                let _permit = permit;
                let bytes = fetcher.fetch_bytes(&url).await?;
                tokio::fs::write(&path, &bytes)
                    .await
                    .map_err(|e| AppError::write_failed(path.display().to_string(), e))?;
                debug!("第 {} 页下载完成 ({} 字节)", page, bytes.len());
                Ok::<_, AppError>(DownloadedPage { page, path })
            });
            handles.push((page, pages[&page].clone(), handle));
        }

        let settled = join_all(handles.into_iter().map(|(page, url, handle)| async move {
            (page, url, handle.await)
        }))
        .await;

        let mut downloaded = Vec::with_capacity(settled.len());
        for (page, url, result) in settled {
            match result {
                Ok(Ok(item)) => downloaded.push(item),
                Ok(Err(e)) => warn!("⚠️ 第 {} 页下载失败，已跳过 ({}): {}", page, url, e),
                Err(e) => error!("❌ 第 {} 页下载任务执行失败 ({}): {}", page, url, e),
            }
        }

        // 顺序只由页码决定，与完成先后无关
        downloaded.sort_by_key(|item| item.page);
        downloaded
    }
}

async fn decode_page(item: &DownloadedPage) -> Result<DecodedPage, AssemblyError> {
    let bytes = tokio::fs::read(&item.path)
        .await
        .map_err(|e| AssemblyError::ImageDecode {
            page: item.page,
            message: e.to_string(),
        })?;
    let image = image::load_from_memory(&bytes).map_err(|e| AssemblyError::ImageDecode {
        page: item.page,
        message: e.to_string(),
    })?;
    let dpi = image_dpi(&bytes).unwrap_or(DEFAULT_DPI);

    Ok(DecodedPage {
        page: item.page,
        image,
        dpi,
    })
}

fn write_pdf(title: &str, pages: Vec<DecodedPage>, path: &Path) -> AppResult<()> {
    let pdf_error = |message: String| AssemblyError::PdfWrite {
        path: path.display().to_string(),
        message,
    };

    let mut pages = pages.into_iter();
    let Some(first) = pages.next() else {
        return Err(AssemblyError::NoPages { name: title.to_string() }.into());
    };

    let (width, height) = page_size_mm(&first);
    let (document, page_index, layer_index) = PdfDocument::new(title, width, height, "page");
    place_image(&document.get_page(page_index).get_layer(layer_index), &first);

    for page in pages {
        let (width, height) = page_size_mm(&page);
        let (page_index, layer_index) = document.add_page(width, height, "page");
        place_image(&document.get_page(page_index).get_layer(layer_index), &page);
    }

    let file = File::create(path).map_err(|e| AppError::write_failed(path.display().to_string(), e))?;
    document
        .save(&mut BufWriter::new(file))
        .map_err(|e| pdf_error(e.to_string()))?;
    Ok(())
}

fn page_size_mm(page: &DecodedPage) -> (Mm, Mm) {
    let (width, height) = page_size_points(page.image.width(), page.image.height(), Some(page.dpi));
    (Mm::from(Pt(width)), Mm::from(Pt(height)))
}

fn place_image(layer: &printpdf::PdfLayerReference, page: &DecodedPage) {
    // 去掉 alpha 通道，按与页面相同的 DPI 放置即可铺满整页
    let rgb = DynamicImage::ImageRgb8(page.image.to_rgb8());
    Image::from_dynamic_image(&rgb).add_to_layer(
        layer.clone(),
        ImageTransform {
            dpi: Some(page.dpi),
            ..Default::default()
        },
    );
}

/// 像素尺寸 → 页面尺寸（point）；DPI 缺失或为 0 时按 72 计算
pub fn page_size_points(width_px: u32, height_px: u32, dpi: Option<f32>) -> (f32, f32) {
    let dpi = dpi.filter(|d| *d > 0.0).unwrap_or(DEFAULT_DPI);
    (
        width_px as f32 * 72.0 / dpi,
        height_px as f32 * 72.0 / dpi,
    )
}

/// 读取图片声明的水平分辨率（JPEG JFIF / PNG pHYs）
pub fn image_dpi(bytes: &[u8]) -> Option<f32> {
    let dpi = if bytes.starts_with(&[0xFF, 0xD8]) {
        jfif_dpi(bytes)
    } else if bytes.starts_with(PNG_SIGNATURE) {
        png_dpi(bytes)
    } else {
        None
    };
    dpi.filter(|d| *d > 0.0)
}

fn jfif_dpi(bytes: &[u8]) -> Option<f32> {
    let mut pos = 2;
    while pos + 4 <= bytes.len() {
        if bytes[pos] != 0xFF {
            return None;
        }
        let marker = bytes[pos + 1];
        let length = u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]) as usize;
        let segment = bytes.get(pos + 4..pos + 2 + length)?;

        if marker == 0xE0 && segment.starts_with(b"JFIF\0") && segment.len() >= 12 {
            let units = segment[7];
            let density = u16::from_be_bytes([segment[8], segment[9]]) as f32;
            return match units {
                1 => Some(density),
                2 => Some(density * 2.54),
                _ => None,
            };
        }
        // 到达扫描数据，后面不会再有 APP0
        if marker == 0xDA {
            return None;
        }
        pos += 2 + length;
    }
    None
}

fn png_dpi(bytes: &[u8]) -> Option<f32> {
    let mut pos = PNG_SIGNATURE.len();
    while pos + 8 <= bytes.len() {
        let length = u32::from_be_bytes(bytes[pos..pos + 4].try_into().ok()?) as usize;
        let kind = &bytes[pos + 4..pos + 8];
        let data = bytes.get(pos + 8..pos + 8 + length)?;

        match kind {
            b"pHYs" if data.len() >= 9 => {
                let per_unit = u32::from_be_bytes(data[0..4].try_into().ok()?) as f32;
                // 单位 1 = 每米像素数
                return (data[8] == 1).then(|| per_unit * 0.0254);
            }
            b"IDAT" | b"IEND" => return None,
            _ => {}
        }
        pos += 12 + length;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::ScriptedFetcher;
    use image::{ImageOutputFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use std::time::Duration;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let image = RgbImage::from_pixel(width, height, Rgb([200, 30, 30]));
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(image)
            .write_to(&mut buffer, ImageOutputFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    fn page_map(entries: &[(u32, &str)]) -> PageImageMap {
        entries.iter().map(|(p, u)| (*p, u.to_string())).collect()
    }

    #[tokio::test]
    async fn test_order_follows_page_index_not_completion() {
        // 页码越小下载越慢
        let fetcher = ScriptedFetcher::images_only()
            .with_image("u1", Duration::from_millis(80), Some(png(2, 2)))
            .with_image("u2", Duration::from_millis(40), Some(png(2, 2)))
            .with_image("u3", Duration::from_millis(0), Some(png(2, 2)));
        let assembler = PdfAssembler::new(Arc::new(fetcher), 3, "unused");
        let scratch = tempfile::tempdir().unwrap();

        let pages = page_map(&[(3, "u3"), (1, "u1"), (2, "u2")]);
        let downloaded = assembler.download_pages(&pages, scratch.path()).await;

        assert_eq!(
            downloaded.iter().map(|d| d.page).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(downloaded.iter().all(|d| d.path.exists()));
    }

    /// 依次取出每个页面字典里的 MediaBox 宽高（页面字典不压缩）
    fn media_boxes(pdf: &[u8]) -> Vec<(f32, f32)> {
        let text = String::from_utf8_lossy(pdf);
        text.match_indices("/MediaBox")
            .filter_map(|(at, _)| {
                let rest = &text[at..];
                let open = rest.find('[')?;
                let close = rest.find(']')?;
                let numbers: Vec<f32> = rest[open + 1..close]
                    .split_whitespace()
                    .filter_map(|n| n.parse().ok())
                    .collect();
                match numbers.as_slice() {
                    [x0, y0, x1, y1] => Some((x1 - x0, y1 - y0)),
                    _ => None,
                }
            })
            .collect()
    }

    #[tokio::test]
    async fn test_pdf_pages_follow_page_index_with_their_own_sizes() {
        // 每页尺寸不同，且页码越小下载越慢
        let fetcher = ScriptedFetcher::images_only()
            .with_image("u1", Duration::from_millis(80), Some(png(100, 50)))
            .with_image("u2", Duration::from_millis(40), Some(png(50, 100)))
            .with_image("u3", Duration::from_millis(0), Some(png(80, 80)));
        let output_dir = tempfile::tempdir().unwrap();
        let assembler = PdfAssembler::new(Arc::new(fetcher), 3, output_dir.path());

        let report = assembler
            .assemble(&page_map(&[(3, "u3"), (1, "u1"), (2, "u2")]), "讲义")
            .await
            .unwrap();
        assert_eq!(report.pages_written, 3);

        let boxes = media_boxes(&std::fs::read(&report.output).unwrap());
        let expected = [(100.0, 50.0), (50.0, 100.0), (80.0, 80.0)];
        assert_eq!(boxes.len(), expected.len(), "media boxes: {:?}", boxes);
        for ((width, height), (want_w, want_h)) in boxes.iter().zip(expected) {
            assert!((width - want_w).abs() < 0.5, "{:?}", boxes);
            assert!((height - want_h).abs() < 0.5, "{:?}", boxes);
        }
    }

    #[tokio::test]
    async fn test_failed_page_is_dropped() {
        let fetcher = ScriptedFetcher::images_only()
            .with_image("u1", Duration::ZERO, Some(png(4, 3)))
            .with_image("u2", Duration::ZERO, None)
            .with_image("u3", Duration::ZERO, Some(png(4, 3)));
        let output_dir = tempfile::tempdir().unwrap();
        let assembler = PdfAssembler::new(Arc::new(fetcher), 2, output_dir.path());

        let report = assembler
            .assemble(&page_map(&[(1, "u1"), (2, "u2"), (3, "u3")]), "第一章/讲义")
            .await
            .unwrap();

        assert_eq!(report.pages_written, 2);
        assert_eq!(report.pages_missing, vec![2]);
        assert_eq!(report.output, output_dir.path().join("第一章_讲义.pdf"));

        let written = std::fs::read(&report.output).unwrap();
        assert!(written.starts_with(b"%PDF"));
        assert!(!output_dir.path().join("第一章_讲义.pdf.part").exists());
    }

    #[tokio::test]
    async fn test_zero_successful_pages_is_failure() {
        let fetcher = ScriptedFetcher::images_only().with_image("u1", Duration::ZERO, None);
        let output_dir = tempfile::tempdir().unwrap();
        let assembler = PdfAssembler::new(Arc::new(fetcher), 2, output_dir.path());

        let result = assembler.assemble(&page_map(&[(1, "u1"), (2, "missing")]), "空").await;

        assert!(matches!(
            result,
            Err(AppError::Assembly(AssemblyError::NoPages { .. }))
        ));
        assert!(!output_dir.path().join("空.pdf").exists());
    }

    #[tokio::test]
    async fn test_empty_map_is_failure() {
        let assembler = PdfAssembler::new(Arc::new(ScriptedFetcher::images_only()), 2, "unused");
        let result = assembler.assemble(&PageImageMap::new(), "空").await;
        assert!(matches!(
            result,
            Err(AppError::Assembly(AssemblyError::NoPages { .. }))
        ));
    }

    #[test]
    fn test_page_size_points() {
        assert_eq!(page_size_points(720, 360, Some(144.0)), (360.0, 180.0));
        assert_eq!(page_size_points(100, 50, Some(0.0)), (100.0, 50.0));
        assert_eq!(page_size_points(100, 50, None), (100.0, 50.0));
    }

    #[test]
    fn test_jfif_density() {
        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        jpeg.extend_from_slice(b"JFIF\0");
        jpeg.extend_from_slice(&[0x01, 0x01, 0x01, 0x00, 0x96, 0x00, 0x96, 0x00, 0x00]);
        assert_eq!(image_dpi(&jpeg), Some(150.0));

        // 单位为 0 时没有物理分辨率
        jpeg[13] = 0x00;
        assert_eq!(image_dpi(&jpeg), None);
    }

    #[test]
    fn test_png_phys_density() {
        let mut bytes = PNG_SIGNATURE.to_vec();
        // 3780 像素/米 ≈ 96 DPI
        bytes.extend_from_slice(&9u32.to_be_bytes());
        bytes.extend_from_slice(b"pHYs");
        bytes.extend_from_slice(&3780u32.to_be_bytes());
        bytes.extend_from_slice(&3780u32.to_be_bytes());
        bytes.push(1);
        bytes.extend_from_slice(&[0, 0, 0, 0]);

        let dpi = image_dpi(&bytes).unwrap();
        assert!((dpi - 96.0).abs() < 0.1);

        // 编码器没有写 pHYs
        assert_eq!(image_dpi(&png(1, 1)), None);
    }
}

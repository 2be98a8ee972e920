//! # 原始字节读取
//!
//! 把四种来源统一成"一段待解码的字节"，并在解码前做完廉价的拒绝：
//!
//! - 体积：所有来源共用 `max_file_size`，Base64 在解码前按长度估算，
//!   网络下载按 `Content-Length` 与累计字节双重限制。
//! - 签名：字节必须带有图片魔数（`infer`），否则视为无效图片编码。
//! - 票据：下载在每一跳、每一块之后核对 `LoadTicket`，过期立即放弃。
//! - 网络目标：默认拒绝本机与内网地址（含 IPv4 映射的 IPv6 与 DNS 解析结果）。

use std::net::IpAddr;
use std::time::Duration;

use base64::{Engine as _, engine::general_purpose};
use tokio::net::lookup_host;

use super::source::RawImageData;
use super::store::LoadTicket;
use super::{ImageSource, RasterConfig, RasterError};

/// 下载达到该长度仍无法识别签名时提前放弃。
const SNIFF_WINDOW: usize = 4096;

/// 读取来源的全部字节并完成解码前校验。
pub(super) async fn fetch_raw(
    source: ImageSource,
    config: &RasterConfig,
    ticket: &LoadTicket<'_>,
) -> Result<RawImageData, RasterError> {
    let (bytes, source_hint) = match source {
        ImageSource::Bytes(bytes) => (bytes, "bytes"),
        ImageSource::FilePath(path) => (read_file(&path, config)?, "file"),
        ImageSource::Base64(text) => (decode_base64(&text, config)?, "base64"),
        ImageSource::Url(url) => (download(&url, config, ticket).await?, "url"),
    };

    check_size(bytes.len() as u64, config)?;
    sniff_image(&bytes)?;

    Ok(RawImageData { bytes, source_hint })
}

fn check_size(len: u64, config: &RasterConfig) -> Result<(), RasterError> {
    if len > config.max_file_size {
        return Err(RasterError::ResourceLimit(format!(
            "图片数据 {} 字节超过上限 {} 字节",
            len, config.max_file_size
        )));
    }
    Ok(())
}

/// 依据魔数判断是否为图片；无法识别即不是有效图片编码。
fn sniff_image(bytes: &[u8]) -> Result<(), RasterError> {
    match infer::get(bytes) {
        Some(kind) if kind.matcher_type() == infer::MatcherType::Image => Ok(()),
        Some(kind) => Err(RasterError::Decode(format!("内容不是图片：{}", kind.mime_type()))),
        None if bytes.is_empty() => Err(RasterError::Decode("图片内容为空".to_string())),
        None => Err(RasterError::Decode("无法识别图片类型".to_string())),
    }
}

fn read_file(path: &str, config: &RasterConfig) -> Result<Vec<u8>, RasterError> {
    log::info!("📁 读取本地图片: {}", path);

    let metadata = std::fs::metadata(path)
        .map_err(|e| RasterError::FileSystem(format!("{}：{}", path, e)))?;
    if !metadata.is_file() {
        return Err(RasterError::FileSystem(format!("{} 不是文件", path)));
    }
    check_size(metadata.len(), config)?;

    std::fs::read(path).map_err(|e| RasterError::FileSystem(format!("{}：{}", path, e)))
}

/// 接受 `data:image/...;base64,...` 或纯 Base64 文本。
fn decode_base64(text: &str, config: &RasterConfig) -> Result<Vec<u8>, RasterError> {
    let text = text.trim();
    let payload = match text.split_once(',') {
        Some((header, payload)) if header.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("data:")) => {
            let media = header.get(5..).unwrap_or_default().to_ascii_lowercase();
            if !media.starts_with("image/") {
                return Err(RasterError::InvalidFormat(format!("Data URL 不是图片：{}", header)));
            }
            if !media.ends_with(";base64") {
                return Err(RasterError::InvalidFormat("Data URL 缺少 base64 标记".to_string()));
            }
            payload.trim()
        }
        _ => text,
    };

    // 每 4 个字符至多还原 3 字节
    check_size((payload.len() as u64).div_ceil(4).saturating_mul(3), config)?;

    general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| RasterError::Decode(format!("Base64 解码失败：{}", e)))
}

async fn download(
    url: &str,
    config: &RasterConfig,
    ticket: &LoadTicket<'_>,
) -> Result<Vec<u8>, RasterError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.download_timeout))
        .connect_timeout(Duration::from_secs(config.connect_timeout))
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| RasterError::Network(e.to_string()))?;

    let mut target = reqwest::Url::parse(url)
        .map_err(|e| RasterError::InvalidFormat(format!("URL 无效：{}", e)))?;
    let mut redirects = 0;

    let mut response = loop {
        ensure_public_target(&target, config).await?;
        ticket.ensure_current()?;

        log::debug!("📡 GET {}://{}{}", target.scheme(), target.host_str().unwrap_or(""), target.path());
        let response = client.get(target.clone()).send().await.map_err(request_failed)?;
        if !response.status().is_redirection() {
            break response;
        }

        redirects += 1;
        if redirects > config.max_redirects {
            return Err(RasterError::Network(format!("重定向超过 {} 次", config.max_redirects)));
        }
        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| RasterError::Network("重定向缺少有效的 Location".to_string()))?;
        target = target
            .join(location)
            .map_err(|e| RasterError::InvalidFormat(format!("重定向地址无效：{}", e)))?;
    };

    let status = response.status();
    if !status.is_success() {
        return Err(RasterError::Network(format!("HTTP {}", status)));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_ascii_lowercase());
    if let Some(content_type) = content_type.filter(|ct| !ct.starts_with("image/")) {
        return Err(RasterError::InvalidFormat(format!("响应不是图片：{}", content_type)));
    }

    if let Some(len) = response.content_length() {
        check_size(len, config)?;
    }

    read_body(&mut response, config, ticket).await
}

/// 逐块读取响应体：首块与后续块各有超时，每块之后核对票据与体积。
async fn read_body(
    response: &mut reqwest::Response,
    config: &RasterConfig,
    ticket: &LoadTicket<'_>,
) -> Result<Vec<u8>, RasterError> {
    let mut body = Vec::new();
    let mut wait = Duration::from_millis(config.stream_first_byte_timeout_ms);
    let mut sniffed = false;

    loop {
        let chunk = tokio::time::timeout(wait, response.chunk())
            .await
            .map_err(|_| RasterError::Timeout(format!("{}ms 内未收到数据", wait.as_millis())))?
            .map_err(request_failed)?;
        ticket.ensure_current()?;

        let Some(chunk) = chunk else {
            log::debug!("✅ 下载完成 - {} bytes", body.len());
            return Ok(body);
        };

        check_size((body.len() + chunk.len()) as u64, config)?;
        body.extend_from_slice(&chunk);

        if !sniffed && body.len() >= SNIFF_WINDOW {
            sniff_image(&body)?;
            sniffed = true;
        }
        wait = Duration::from_millis(config.stream_chunk_timeout_ms);
    }
}

fn request_failed(e: reqwest::Error) -> RasterError {
    if e.is_timeout() {
        RasterError::Timeout(e.to_string())
    } else {
        RasterError::Network(e.to_string())
    }
}

/// 目标必须是 http(s)；未开启 `allow_private_network` 时，
/// 字面 IP 与 DNS 解析出的所有地址都不得指向本机或内网。
async fn ensure_public_target(url: &reqwest::Url, config: &RasterConfig) -> Result<(), RasterError> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(RasterError::InvalidFormat(format!("不支持的协议：{}", url.scheme())));
    }
    if config.allow_private_network {
        return Ok(());
    }

    let host = url
        .host_str()
        .ok_or_else(|| RasterError::InvalidFormat("URL 缺少主机".to_string()))?;
    let literal = host.trim_start_matches('[').trim_end_matches(']');

    if let Ok(ip) = literal.parse::<IpAddr>() {
        return reject_restricted(ip);
    }

    let name = host.trim_end_matches('.').to_ascii_lowercase();
    if name == "localhost" || name.ends_with(".localhost") || name.ends_with(".local") {
        return Err(RasterError::InvalidFormat(format!("禁止访问本机地址：{}", host)));
    }

    ensure_public_name(&name, url.port_or_known_default().unwrap_or(80)).await
}

async fn ensure_public_name(name: &str, port: u16) -> Result<(), RasterError> {
    let addrs = lookup_host((name, port))
        .await
        .map_err(|e| RasterError::Network(format!("无法解析 {}：{}", name, e)))?;

    for addr in addrs {
        reject_restricted(addr.ip())?;
    }
    Ok(())
}

fn reject_restricted(ip: IpAddr) -> Result<(), RasterError> {
    if is_restricted(ip) {
        return Err(RasterError::InvalidFormat(format!("禁止访问内网地址：{}", ip)));
    }
    Ok(())
}

fn is_restricted(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, ..] = v4.octets();
            v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_documentation()
                || v4.is_unspecified()
                || v4.is_multicast()
                || a == 0
                // 100.64.0.0/10 运营商级 NAT
                || (a == 100 && (b & 0xc0) == 0x40)
        }
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_restricted(IpAddr::V4(v4)),
            None => {
                v6.is_loopback()
                    || v6.is_unspecified()
                    || v6.is_multicast()
                    || v6.is_unique_local()
                    || v6.is_unicast_link_local()
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::RasterStore;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    const PNG_HEADER: [u8; 12] = [137, 80, 78, 71, 13, 10, 26, 10, 0, 0, 0, 13];

    fn private_ok() -> RasterConfig {
        RasterConfig {
            allow_private_network: true,
            ..RasterConfig::default()
        }
    }

    fn url(text: &str) -> reqwest::Url {
        reqwest::Url::parse(text).expect("valid url")
    }

    fn serve_once(head: String, body: Vec<u8>) -> (u16, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server failed");
        let port = listener.local_addr().expect("read local addr failed").port();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept failed");
            let mut request = [0u8; 1024];
            let _ = stream.read(&mut request);

            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(&body);
            let _ = stream.flush();
        });

        (port, server)
    }

    fn ok_head(content_type: &str, len: usize) -> String {
        format!(
            "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            content_type, len
        )
    }

    #[tokio::test]
    async fn private_literals_are_rejected_by_default() {
        let config = RasterConfig::default();

        for target in [
            "http://127.0.0.1/a.png",
            "http://10.1.2.3/a.png",
            "http://192.168.1.20/a.png",
            "http://100.64.0.1/a.png",
            "http://[::1]/a.png",
            "http://[fd00::1]/a.png",
            "http://[::ffff:127.0.0.1]/a.png",
            "http://[::ffff:192.168.0.1]/a.png",
            "https://localhost/a.png",
            "http://printer.local/a.png",
        ] {
            assert!(
                matches!(
                    ensure_public_target(&url(target), &config).await,
                    Err(RasterError::InvalidFormat(_))
                ),
                "{target} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn public_literal_passes_without_lookup() {
        let result = ensure_public_target(&url("http://93.184.216.34/a.png"), &RasterConfig::default()).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn names_resolving_to_loopback_are_rejected() {
        let result = ensure_public_name("localhost", 80).await;

        assert!(matches!(result, Err(RasterError::InvalidFormat(_))));
    }

    #[tokio::test]
    async fn private_targets_allowed_when_enabled() {
        assert!(ensure_public_target(&url("http://127.0.0.1/a.png"), &private_ok()).await.is_ok());
        assert!(ensure_public_target(&url("http://localhost/a.png"), &private_ok()).await.is_ok());
    }

    #[tokio::test]
    async fn non_http_schemes_are_rejected() {
        let result = ensure_public_target(&url("file:///etc/passwd"), &private_ok()).await;

        assert!(matches!(result, Err(RasterError::InvalidFormat(_))));
    }

    #[test]
    fn mapped_ipv6_uses_ipv4_rules() {
        assert!(is_restricted("::ffff:10.0.0.1".parse().expect("ip")));
        assert!(!is_restricted("::ffff:8.8.8.8".parse().expect("ip")));
        assert!(!is_restricted("2001:4860:4860::8888".parse().expect("ip")));
    }

    #[test]
    fn data_url_payload_is_decoded() {
        let data_url = format!("data:image/png;base64,{}", general_purpose::STANDARD.encode(PNG_HEADER));

        let bytes = decode_base64(&data_url, &RasterConfig::default()).expect("decode failed");

        assert_eq!(bytes, PNG_HEADER);
    }

    #[test]
    fn non_image_data_url_is_invalid_format() {
        let result = decode_base64("data:text/plain;base64,SGVsbG8=", &RasterConfig::default());

        assert!(matches!(result, Err(RasterError::InvalidFormat(_))));
    }

    #[test]
    fn base64_is_bounded_before_decoding() {
        let config = RasterConfig {
            max_file_size: 32,
            ..RasterConfig::default()
        };

        let result = decode_base64(&"A".repeat(1024 * 1024), &config);

        assert!(matches!(result, Err(RasterError::ResourceLimit(_))));
    }

    #[test]
    fn missing_file_is_filesystem_error() {
        let result = read_file("/definitely/not/here.png", &RasterConfig::default());

        assert!(matches!(result, Err(RasterError::FileSystem(_))));
    }

    #[tokio::test]
    async fn bytes_without_image_signature_are_decode_errors() {
        let store = RasterStore::default();
        let ticket = store.issue_ticket();

        let text = fetch_raw(ImageSource::Bytes(b"hello".to_vec()), &RasterConfig::default(), &ticket).await;
        let empty = fetch_raw(ImageSource::Bytes(Vec::new()), &RasterConfig::default(), &ticket).await;

        assert!(matches!(text, Err(RasterError::Decode(_))));
        assert!(matches!(empty, Err(RasterError::Decode(_))));
    }

    #[tokio::test]
    async fn oversized_bytes_are_rejected() {
        let store = RasterStore::default();
        let ticket = store.issue_ticket();
        let config = RasterConfig {
            max_file_size: 4,
            ..RasterConfig::default()
        };

        let result = fetch_raw(ImageSource::Bytes(PNG_HEADER.to_vec()), &config, &ticket).await;

        assert!(matches!(result, Err(RasterError::ResourceLimit(_))));
    }

    #[tokio::test]
    async fn url_body_must_carry_image_signature() {
        let body = b"hello world".to_vec();
        let (port, server) = serve_once(ok_head("image/png", body.len()), body);
        let store = RasterStore::default();
        let ticket = store.issue_ticket();

        let source = ImageSource::Url(format!("http://127.0.0.1:{}/fake.png", port));
        let result = fetch_raw(source, &private_ok(), &ticket).await;
        server.join().expect("server thread failed");

        assert!(matches!(result, Err(RasterError::Decode(_))));
    }

    #[tokio::test]
    async fn url_with_html_content_type_is_rejected() {
        let body = b"<html></html>".to_vec();
        let (port, server) = serve_once(ok_head("text/html; charset=utf-8", body.len()), body);
        let store = RasterStore::default();
        let ticket = store.issue_ticket();

        let source = ImageSource::Url(format!("http://127.0.0.1:{}/page", port));
        let result = fetch_raw(source, &private_ok(), &ticket).await;
        server.join().expect("server thread failed");

        assert!(matches!(result, Err(RasterError::InvalidFormat(_))));
    }

    #[tokio::test]
    async fn redirects_beyond_limit_fail() {
        let head = "HTTP/1.1 302 Found\r\nLocation: /again.png\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            .to_string();
        let (port, server) = serve_once(head, Vec::new());
        let store = RasterStore::default();
        let ticket = store.issue_ticket();
        let config = RasterConfig {
            max_redirects: 0,
            ..private_ok()
        };

        let result = download(&format!("http://127.0.0.1:{}/start.png", port), &config, &ticket).await;
        server.join().expect("server thread failed");

        assert!(matches!(result, Err(RasterError::Network(_))));
    }

    #[tokio::test]
    async fn stale_ticket_stops_download_before_request() {
        let store = RasterStore::default();
        let stale = store.issue_ticket();
        let _newer = store.issue_ticket();

        let result = download("http://127.0.0.1:9/a.png", &private_ok(), &stale).await;

        assert!(matches!(result, Err(RasterError::Superseded)));
    }
}

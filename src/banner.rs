use std::net::{IpAddr, UdpSocket};

use qrcode::render::unicode::Dense1x2;
use qrcode::QrCode;
use tracing::{info, warn};

/// First non-loopback IPv4 address, found by asking the OS which interface
/// would route to a public address. Nothing is sent.
pub fn network_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    let ip = socket.local_addr().ok()?.ip();
    (ip.is_ipv4() && !ip.is_loopback() && !ip.is_unspecified()).then_some(ip)
}

pub fn network_url(ip: Option<IpAddr>, port: u16) -> String {
    match ip {
        Some(ip) => format!("http://{}:{}", ip, port),
        None => format!("http://localhost:{}", port),
    }
}

/// Terminal QR code for `url`, two modules per character row.
pub fn render_qr(url: &str) -> Result<String, qrcode::types::QrError> {
    let code = QrCode::new(url.as_bytes())?;
    Ok(code
        .render::<Dense1x2>()
        .dark_color(Dense1x2::Light)
        .light_color(Dense1x2::Dark)
        .quiet_zone(true)
        .build())
}

pub fn print_banner(port: u16) {
    let network_url = network_url(network_ip(), port);

    info!("🚀 Kenya Market Intelligence Dashboard running at:");
    info!("   📱 Local:    http://localhost:{}", port);
    info!("   🌐 Network:  {}", network_url);

    // Printed raw so the log prefix does not break the code's rows
    match render_qr(&network_url) {
        Ok(qr) => println!("\n📱 Scan to open on your phone:\n{}", qr),
        Err(e) => warn!("Could not render QR code: {}", e),
    }

    info!("📊 Market research dashboard for East African markets");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_url_falls_back_to_localhost() {
        assert_eq!(network_url(None, 3000), "http://localhost:3000");
        assert_eq!(
            network_url(Some(IpAddr::from([192, 168, 1, 20])), 8080),
            "http://192.168.1.20:8080"
        );
    }

    #[test]
    fn test_render_qr_is_square_block_text() {
        let qr = render_qr("http://192.168.1.20:3000").unwrap();
        let rows: Vec<&str> = qr.lines().collect();

        assert!(rows.len() > 10);
        let width = rows[0].chars().count();
        assert!(rows.iter().all(|row| row.chars().count() == width));
        // Dense1x2 packs two modules per row
        assert!((rows.len() * 2).abs_diff(width) <= 1);
    }
}

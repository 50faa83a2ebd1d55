use std::net::SocketAddr;

use tokio::net::UdpSocket;

use crate::{
    config::RtpReceiverConfig,
    errors::RtpReceiverResult,
    events::ReceiverObserver,
    router::VideoStreamRouter,
};

/// Expected udp payload ceiling, mtu plus headroom.
const MAX_DATAGRAM_SIZE: usize = 2048;

/// The inbound socket adapter: one task owns the socket and the router,
/// so every datagram reaches the router on the same task in arrival order.
pub struct UdpVideoReceiver {
    socket: UdpSocket,
    local_port: u16,
    router: VideoStreamRouter,
}

impl UdpVideoReceiver {
    pub async fn bind(config: RtpReceiverConfig) -> RtpReceiverResult<Self> {
        let socket =
            UdpSocket::bind(SocketAddr::new(config.bind_address, config.bind_port)).await?;
        let local_addr = socket.local_addr()?;
        tracing::info!("rtp video receiver listening on {}", local_addr);
        Ok(Self {
            socket,
            local_port: local_addr.port(),
            router: VideoStreamRouter::new(config),
        })
    }

    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    pub fn set_observer(&mut self, observer: Box<dyn ReceiverObserver>) {
        self.router.set_observer(observer);
    }

    pub fn router_mut(&mut self) -> &mut VideoStreamRouter {
        &mut self.router
    }

    pub async fn run(&mut self) -> RtpReceiverResult<()> {
        let mut buffer = [0_u8; MAX_DATAGRAM_SIZE];
        loop {
            let (size, remote_addr) = self.socket.recv_from(&mut buffer).await?;
            self.router
                .on_datagram(self.local_port, remote_addr, &buffer[..size]);
            if self.router.is_closed() {
                return Ok(());
            }
        }
    }

    pub fn close(&mut self, reason: &str) {
        self.router.close(reason);
    }
}

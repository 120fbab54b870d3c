//! Host command channel: fixed-size jtag_vpi-style frames over TCP.
//!
//! An external JTAG host (OpenOCD's `jtag_vpi` driver) connects to a TCP
//! listener and exchanges 1036-byte little-endian command frames. The only
//! cJTAG-aware command is `OSCAN1_RAW`, which applies one TCKC/TMSC pair and
//! reads back the TMSC output register. The socket is polled without
//! blocking; between polls the bridge clock advances freely.

use std::convert::TryFrom;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use thiserror::Error;

use crate::bridge::CjtagBridge;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to bind host listener")]
    Bind(#[source] io::Error),
    #[error("socket I/O error")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Size of each frame's data buffers.
pub const XFERT_MAX_SIZE: usize = 512;

/// Total encoded frame length: cmd + buffer_out + buffer_in + length + nb_bits.
pub const FRAME_LEN: usize = 4 + XFERT_MAX_SIZE + XFERT_MAX_SIZE + 4 + 4;

/// Sentinel placed in `buffer_in[0]` when rejecting a command.
pub const ERR_UNSUPPORTED: u8 = 0xFF;

/// Synchronized ticks advanced between socket polls.
const TICKS_PER_POLL: u32 = 100;

/// Ticks the asynchronous reset is held asserted for a RESET command.
const RESET_BURST_TICKS: u32 = 32;

/// Host command codes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum HostCommand {
    Reset = 0,
    TmsSeq = 1,
    ScanChain = 2,
    ScanChainFlipTms = 3,
    StopSimu = 4,
    Oscan1Raw = 5,
}

/// One fixed-layout command frame.
///
/// The wire format is a packed little-endian record, decoded field by field;
/// it deliberately does not mirror any in-memory structure layout.
#[derive(Clone)]
pub struct CommandFrame {
    pub cmd: u32,
    pub buffer_out: [u8; XFERT_MAX_SIZE],
    pub buffer_in: [u8; XFERT_MAX_SIZE],
    pub length: u32,
    pub nb_bits: u32,
}

impl CommandFrame {
    pub fn new(cmd: HostCommand) -> CommandFrame {
        CommandFrame {
            cmd: cmd.into(),
            buffer_out: [0; XFERT_MAX_SIZE],
            buffer_in: [0; XFERT_MAX_SIZE],
            length: 0,
            nb_bits: 0,
        }
    }

    /// Decode a frame from its 1036-byte wire form.
    pub fn from_bytes(bytes: &[u8; FRAME_LEN]) -> CommandFrame {
        let cmd = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let mut buffer_out = [0u8; XFERT_MAX_SIZE];
        buffer_out.copy_from_slice(&bytes[4..4 + XFERT_MAX_SIZE]);
        let mut buffer_in = [0u8; XFERT_MAX_SIZE];
        buffer_in.copy_from_slice(&bytes[516..516 + XFERT_MAX_SIZE]);
        let length = u32::from_le_bytes([bytes[1028], bytes[1029], bytes[1030], bytes[1031]]);
        let nb_bits = u32::from_le_bytes([bytes[1032], bytes[1033], bytes[1034], bytes[1035]]);
        CommandFrame { cmd, buffer_out, buffer_in, length, nb_bits }
    }

    /// Encode to the 1036-byte wire form.
    pub fn to_bytes(&self) -> [u8; FRAME_LEN] {
        let mut bytes = [0u8; FRAME_LEN];
        bytes[0..4].copy_from_slice(&self.cmd.to_le_bytes());
        bytes[4..4 + XFERT_MAX_SIZE].copy_from_slice(&self.buffer_out);
        bytes[516..516 + XFERT_MAX_SIZE].copy_from_slice(&self.buffer_in);
        bytes[1028..1032].copy_from_slice(&self.length.to_le_bytes());
        bytes[1032..1036].copy_from_slice(&self.nb_bits.to_le_bytes());
        bytes
    }
}

struct Client {
    stream: TcpStream,
    buf: Box<[u8; FRAME_LEN]>,
    fill: usize,
}

/// TCP server owning the bridge model and its simulation clock.
pub struct VpiServer {
    listener: TcpListener,
    client: Option<Client>,
    bridge: CjtagBridge,
    settle_ticks: u32,
}

impl VpiServer {
    /// Bind the host listener. A bind or listen failure here is fatal.
    pub fn bind(port: u16, settle_ticks: u32) -> Result<VpiServer> {
        let listener = TcpListener::bind(("0.0.0.0", port)).map_err(Error::Bind)?;
        listener.set_nonblocking(true)?;
        log::info!("host listener on port {}", listener.local_addr()?.port());
        Ok(VpiServer {
            listener,
            client: None,
            bridge: CjtagBridge::new(),
            settle_ticks,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn bridge(&self) -> &CjtagBridge {
        &self.bridge
    }

    /// Run the simulation loop until the host sends STOP_SIMU.
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.bridge.run(TICKS_PER_POLL);
            self.poll_accept()?;
            match self.poll_frame()? {
                Some(frame) => {
                    if !self.dispatch(frame)? {
                        log::info!("host requested simulation stop");
                        return Ok(());
                    }
                }
                None => {
                    if self.client.is_none() {
                        // Nothing to serve; don't spin a core while idle.
                        std::thread::sleep(Duration::from_micros(50));
                    }
                }
            }
        }
    }

    fn poll_accept(&mut self) -> Result<()> {
        if self.client.is_some() {
            return Ok(());
        }
        match self.listener.accept() {
            Ok((stream, addr)) => {
                log::info!("host connected from {}", addr);
                stream.set_nonblocking(true)?;
                self.client = Some(Client {
                    stream,
                    buf: Box::new([0; FRAME_LEN]),
                    fill: 0,
                });
                Ok(())
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Try to complete one frame from the client. Partial reads accumulate
    /// across polls; a zero-length read or hard error closes the client and
    /// the server resumes listening.
    fn poll_frame(&mut self) -> Result<Option<CommandFrame>> {
        let outcome = match self.client.as_mut() {
            Some(client) => Self::read_client(client),
            None => return Ok(None),
        };
        match outcome {
            ClientIo::Frame(frame) => Ok(Some(frame)),
            ClientIo::Pending => Ok(None),
            ClientIo::Closed => {
                log::info!("host disconnected");
                self.client = None;
                Ok(None)
            }
        }
    }

    fn read_client(client: &mut Client) -> ClientIo {
        loop {
            match client.stream.read(&mut client.buf[client.fill..]) {
                Ok(0) => return ClientIo::Closed,
                Ok(n) => {
                    client.fill += n;
                    if client.fill == FRAME_LEN {
                        client.fill = 0;
                        return ClientIo::Frame(CommandFrame::from_bytes(&client.buf));
                    }
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    return ClientIo::Pending;
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    log::warn!("host connection error: {}", e);
                    return ClientIo::Closed;
                }
            }
        }
    }

    /// Execute one command. Returns false when the host asked to stop.
    fn dispatch(&mut self, mut frame: CommandFrame) -> Result<bool> {
        match HostCommand::try_from(frame.cmd) {
            Ok(HostCommand::Reset) => {
                log::debug!("cmd: reset burst");
                self.bridge.set_ntrst(false);
                self.bridge.run(RESET_BURST_TICKS);
                self.bridge.set_ntrst(true);
                self.bridge.run(self.settle_ticks);
                frame.buffer_in[0] = 0;
                self.respond(&frame)?;
            }
            Ok(HostCommand::TmsSeq) => {
                let nbits = frame
                    .nb_bits
                    .min(frame.length.saturating_mul(8))
                    .min((XFERT_MAX_SIZE * 8) as u32);
                log::debug!("cmd: tms sequence, {} bits", nbits);
                for i in 0..nbits as usize {
                    let bit = (frame.buffer_out[i / 8] >> (i % 8)) & 1 == 1;
                    self.bridge.set_tckc(false);
                    self.bridge.run(self.settle_ticks);
                    self.bridge.set_tmsc(bit);
                    self.bridge.set_tckc(true);
                    self.bridge.run(self.settle_ticks);
                }
                frame.buffer_in[0] = 0;
                self.respond(&frame)?;
            }
            Ok(HostCommand::ScanChain) | Ok(HostCommand::ScanChainFlipTms) => {
                log::warn!(
                    "cmd: legacy four-wire scan command {} rejected",
                    frame.cmd,
                );
                frame.buffer_in[0] = ERR_UNSUPPORTED;
                self.respond(&frame)?;
            }
            Ok(HostCommand::StopSimu) => return Ok(false),
            Ok(HostCommand::Oscan1Raw) => {
                let tckc = frame.buffer_out[0] & 0x01 != 0;
                let tmsc = frame.buffer_out[0] & 0x02 != 0;
                log::trace!("cmd: oscan1 raw, tckc={} tmsc={}", tckc, tmsc);
                self.bridge.set_tckc(tckc);
                self.bridge.set_tmsc(tmsc);
                self.bridge.run(self.settle_ticks);
                frame.buffer_in[0] = self.bridge.tmsc_o() as u8;
                self.respond(&frame)?;
            }
            Err(_) => {
                log::warn!("cmd: unknown command code {:#010x}", frame.cmd);
                frame.buffer_in[0] = ERR_UNSUPPORTED;
                self.respond(&frame)?;
            }
        }
        Ok(true)
    }

    /// Write a full response frame, riding out non-blocking short writes.
    fn respond(&mut self, frame: &CommandFrame) -> Result<()> {
        let alive = match self.client.as_mut() {
            Some(client) => Self::write_frame(client, &frame.to_bytes()),
            None => return Ok(()),
        };
        if !alive {
            log::warn!("host connection lost while responding");
            self.client = None;
        }
        Ok(())
    }

    fn write_frame(client: &mut Client, bytes: &[u8; FRAME_LEN]) -> bool {
        let mut sent = 0;
        while sent < bytes.len() {
            match client.stream.write(&bytes[sent..]) {
                Ok(0) => return false,
                Ok(n) => sent += n,
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    std::thread::sleep(Duration::from_micros(50));
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    log::warn!("host connection error: {}", e);
                    return false;
                }
            }
        }
        true
    }
}

/// Result of a non-blocking attempt to read one frame.
enum ClientIo {
    Frame(CommandFrame),
    Pending,
    Closed,
}

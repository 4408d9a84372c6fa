//! Mock serial port for testing
//!
//! Stands in for the boiler's service port: every CR-terminated command
//! written to it queues the reply scripted for that command. Reads with
//! nothing queued stay pending, the way a quiet serial line does, so the
//! handle's timeouts behave as they do against hardware.

use crate::protocol::command::Command;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock serial port that simulates bidirectional communication
#[derive(Clone, Default)]
pub struct MockSerialPort {
    /// Data written to the port (outgoing)
    tx_buffer: Arc<Mutex<Vec<u8>>>,
    /// Data to be read from the port (incoming)
    rx_buffer: Arc<Mutex<VecDeque<u8>>>,
    /// Partial command line not yet terminated by CR
    line: Arc<Mutex<Vec<u8>>>,
    /// Replies keyed by command mnemonic
    script: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    /// Simulated error for the next read or write
    next_error: Arc<Mutex<Option<io::Error>>>,
    rx_waker: Arc<Mutex<Option<Waker>>>,
}

impl MockSerialPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `response` every time `command` is written.
    pub fn script(&self, command: Command, response: &[u8]) {
        lock(&self.script).insert(command.mnemonic().to_string(), response.to_vec());
    }

    /// Stop answering `command`.
    pub fn unscript(&self, command: Command) {
        lock(&self.script).remove(command.mnemonic());
    }

    /// Queue data to be read from the port
    pub fn queue_rx_data(&self, data: &[u8]) {
        lock(&self.rx_buffer).extend(data);
        if let Some(waker) = lock(&self.rx_waker).take() {
            waker.wake();
        }
    }

    /// Bytes queued but not yet read
    pub fn rx_pending(&self) -> usize {
        lock(&self.rx_buffer).len()
    }

    /// Get data that was written to the port
    pub fn get_tx_data(&self) -> Vec<u8> {
        lock(&self.tx_buffer).clone()
    }

    /// Commands written so far, in order
    pub fn sent_commands(&self) -> Vec<String> {
        let tx = self.get_tx_data();
        tx.split(|&b| b == b'\r')
            .filter(|line| !line.is_empty())
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect()
    }

    /// Clear all buffers; the script is kept
    pub fn clear(&self) {
        lock(&self.tx_buffer).clear();
        lock(&self.rx_buffer).clear();
        lock(&self.line).clear();
    }

    /// Set an error to be returned on the next operation
    pub fn set_next_error(&self, error: io::Error) {
        *lock(&self.next_error) = Some(error);
    }

    fn take_error(&self) -> Option<io::Error> {
        lock(&self.next_error).take()
    }

    fn answer(&self, written: &[u8]) {
        let mut replies = Vec::new();
        {
            let mut line = lock(&self.line);
            for &byte in written {
                if byte == b'\r' {
                    let mnemonic = String::from_utf8_lossy(&line).into_owned();
                    if let Some(reply) = lock(&self.script).get(&mnemonic) {
                        replies.push(reply.clone());
                    }
                    line.clear();
                } else {
                    line.push(byte);
                }
            }
        }
        for reply in replies {
            self.queue_rx_data(&reply);
        }
    }
}

impl AsyncRead for MockSerialPort {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if let Some(error) = self.take_error() {
            return Poll::Ready(Err(error));
        }

        let mut rx = lock(&self.rx_buffer);
        if rx.is_empty() {
            *lock(&self.rx_waker) = Some(cx.waker().clone());
            return Poll::Pending;
        }

        let available = rx.len().min(buf.remaining());
        let data: Vec<u8> = rx.drain(..available).collect();
        buf.put_slice(&data);
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockSerialPort {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if let Some(error) = self.take_error() {
            return Poll::Ready(Err(error));
        }

        lock(&self.tx_buffer).extend_from_slice(buf);
        self.answer(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

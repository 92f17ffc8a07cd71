// Copyright (c) 2023 Huawei Device Co., Ltd.
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Send and receive window definitions for stream and connection flow
//! control.

use ylong_http_codec::h2::{ErrorCode, H2Error, MAX_FLOW_CONTROL_WINDOW};

pub(crate) struct SendWindow {
    // As the sending window, only the size visible to this endpoint is kept;
    // it grows on SETTINGS and WINDOW_UPDATE from the peer. Negative values
    // are legal after a SETTINGS shrink and only block further sends.
    size: i32,
}

impl SendWindow {
    pub(crate) fn new(size: i32) -> Self {
        Self { size }
    }

    pub(crate) fn size_available(&self) -> u32 {
        if self.size < 0 {
            0
        } else {
            self.size as u32
        }
    }

    pub(crate) fn reduce_size(&mut self, size: u32) {
        self.size -= size as i32;
    }

    pub(crate) fn increase_size(&mut self, size: u32) -> Result<(), H2Error> {
        let (curr, overflow) = self.size.overflowing_add(size as i32);
        if overflow || curr > MAX_FLOW_CONTROL_WINDOW as i32 {
            return Err(H2Error::ConnectionError(ErrorCode::FlowControlError));
        }
        self.size = curr;
        Ok(())
    }

    pub(crate) fn send_data(&mut self, size: u32) {
        self.size -= size as i32;
    }
}

#[derive(Default)]
pub(crate) struct RecvWindow {
    // The window size visible to the peer. It shrinks when DATA is received
    // and grows when a WINDOW_UPDATE is sent.
    notification: i32,
    // The window size this endpoint maintains. It only changes when the
    // application reconfigures flow control.
    actual: i32,
}

impl RecvWindow {
    pub(crate) fn new(size: i32) -> Self {
        Self {
            notification: size,
            actual: size,
        }
    }

    pub(crate) fn unreleased_size(&self) -> Option<u32> {
        let unreleased = self.actual - self.notification;
        if unreleased <= 0 {
            return None;
        }
        // Update the peer once half the window is unreleased.
        if unreleased * 2 > self.notification {
            Some(unreleased as u32)
        } else {
            None
        }
    }

    pub(crate) fn actual_size(&self) -> i32 {
        self.actual
    }

    pub(crate) fn notification_available(&self) -> u32 {
        if self.notification < 0 {
            0
        } else {
            self.notification as u32
        }
    }

    pub(crate) fn reduce_actual(&mut self, size: u32) {
        self.actual -= size as i32;
    }

    pub(crate) fn increase_actual(&mut self, size: u32) {
        self.actual += size as i32;
    }

    pub(crate) fn reduce_notification(&mut self, size: u32) {
        self.notification -= size as i32;
    }

    pub(crate) fn increase_notification(&mut self, size: u32) {
        self.notification += size as i32;
    }

    // Returns the WINDOW_UPDATE delta to send, if the unreleased size has
    // crossed the update threshold.
    pub(crate) fn check_window_update(&mut self) -> Option<u32> {
        let size = self.unreleased_size()?;
        self.increase_notification(size);
        Some(size)
    }

    pub(crate) fn recv_data(&mut self, size: u32) {
        self.notification -= size as i32;
    }
}

pub(crate) struct FlowControl {
    recv_window: RecvWindow,
    send_window: SendWindow,
}

impl FlowControl {
    pub(crate) fn new(conn_recv_window: u32, conn_send_window: u32) -> Self {
        FlowControl {
            recv_window: RecvWindow::new(conn_recv_window as i32),
            send_window: SendWindow::new(conn_send_window as i32),
        }
    }

    pub(crate) fn check_conn_recv_window_update(&mut self) -> Option<u32> {
        self.recv_window.check_window_update()
    }

    pub(crate) fn setup_recv_window(&mut self, size: u32) {
        let actual = self.recv_window.actual_size() as u32;
        if size > actual {
            self.recv_window.increase_actual(size - actual);
        } else {
            self.recv_window.reduce_actual(actual - size);
        }
    }

    pub(crate) fn increase_send_size(&mut self, size: u32) -> Result<(), H2Error> {
        self.send_window.increase_size(size)
    }

    pub(crate) fn send_size_available(&self) -> usize {
        self.send_window.size_available() as usize
    }

    pub(crate) fn recv_notification_size_available(&self) -> u32 {
        self.recv_window.notification_available()
    }

    pub(crate) fn send_data(&mut self, size: u32) {
        self.send_window.send_data(size)
    }

    pub(crate) fn recv_data(&mut self, size: u32) {
        self.recv_window.recv_data(size)
    }
}


#[cfg(test)]
mod ut_recv_window {
    use super::*;

    /// UT test case for `RecvWindow::check_window_update`.
    ///
    /// # Brief
    /// 1. Receives data below and above the half-window threshold.
    /// 2. Checks that an update is only produced past the threshold and that
    ///    the notification window is replenished.
    #[test]
    fn ut_rw_check_window_update() {
        let mut rw = RecvWindow::new(100);
        rw.recv_data(20);
        assert_eq!(rw.check_window_update(), None);
        rw.recv_data(40);
        assert_eq!(rw.check_window_update(), Some(60));
        assert_eq!(rw.notification_available(), 100);
    }

    /// UT test case for notification underflow.
    ///
    /// # Brief
    /// 1. Receives more data than the window allows.
    /// 2. Checks that the available size clamps to zero.
    #[test]
    fn ut_rw_underflow() {
        let mut rw = RecvWindow::new(10);
        rw.recv_data(15);
        assert_eq!(rw.notification_available(), 0);
    }
}

//! Display sinks: where rendered scenes go.
//!
//! The control loop only ever calls [`DisplaySink::refresh`] and
//! [`DisplaySink::blank`], from its own thread, after all slot updates for
//! the cycle are done. A hardware matrix driver implements the same trait by
//! drawing into its own `embedded-graphics` target with
//! [`renderer::draw_scene`](crate::renderer::draw_scene).

use crate::renderer::{draw_ascii, draw_blank, draw_scene, Framebuffer};
use crate::scene::Scene;
use std::io::Write;
use thiserror::Error;

/// Errors a sink may report. The loop logs them and keeps going.
#[derive(Error, Debug)]
pub enum DisplayError {
    /// Output device write failed
    #[error("display output failed: {0}")]
    Io(#[from] std::io::Error),

    /// Failure reported by an out-of-tree matrix driver
    #[error("display driver error: {0}")]
    Driver(String),
}

/// Output side of the sign
pub trait DisplaySink {
    /// Push the current scene to the panel
    fn refresh(&mut self, scene: &Scene) -> Result<(), DisplayError>;

    /// Show an empty frame
    fn blank(&mut self) -> Result<(), DisplayError>;
}

impl<D: DisplaySink + ?Sized> DisplaySink for Box<D> {
    fn refresh(&mut self, scene: &Scene) -> Result<(), DisplayError> {
        (**self).refresh(scene)
    }

    fn blank(&mut self) -> Result<(), DisplayError> {
        (**self).blank()
    }
}

/// Rasterises into an in-memory frame.
#[derive(Clone, Debug)]
pub struct FramebufferSink {
    frame: Framebuffer,
    background: u32,
    refreshes: u64,
}

impl FramebufferSink {
    pub fn new(width: u32, height: u32, background: u32) -> Self {
        Self {
            frame: Framebuffer::new(width, height),
            background,
            refreshes: 0,
        }
    }

    /// Most recently pushed frame
    pub fn frame(&self) -> &Framebuffer {
        &self.frame
    }

    /// Number of frames pushed so far, blanks included
    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }
}

impl DisplaySink for FramebufferSink {
    fn refresh(&mut self, scene: &Scene) -> Result<(), DisplayError> {
        if let Err(never) = draw_scene(scene, &mut self.frame) {
            match never {}
        }
        self.refreshes += 1;
        Ok(())
    }

    fn blank(&mut self) -> Result<(), DisplayError> {
        if let Err(never) = draw_blank(self.background, &mut self.frame) {
            match never {}
        }
        self.refreshes += 1;
        Ok(())
    }
}

/// Development sink: renders each frame as ASCII art on a terminal.
///
/// Frames are drawn over each other with an ANSI cursor-home sequence, and a
/// frame identical to the previous one is not written again.
pub struct TerminalSink<W: Write> {
    inner: FramebufferSink,
    out: W,
    last: Option<String>,
}

impl<W: Write> TerminalSink<W> {
    pub fn new(inner: FramebufferSink, out: W) -> Self {
        Self {
            inner,
            out,
            last: None,
        }
    }

    fn flush_frame(&mut self) -> Result<(), DisplayError> {
        let ascii = draw_ascii(self.inner.frame());
        if self.last.as_deref() == Some(ascii.as_str()) {
            return Ok(());
        }
        write!(self.out, "\x1b[H{ascii}")?;
        self.out.flush()?;
        self.last = Some(ascii);
        Ok(())
    }
}

impl<W: Write> DisplaySink for TerminalSink<W> {
    fn refresh(&mut self, scene: &Scene) -> Result<(), DisplayError> {
        self.inner.refresh(scene)?;
        self.flush_frame()
    }

    fn blank(&mut self) -> Result<(), DisplayError> {
        self.inner.blank()?;
        self.flush_frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::ArrivalSet;

    fn scene() -> Scene {
        let config = Config::default();
        let mut scene = Scene::new(&config);
        let set = ArrivalSet::new(vec![3, 7, 15], "Q", "Coney Island", false).unwrap();
        scene.apply(Some(&set), true, &config.schedule);
        scene
    }

    #[test]
    fn test_framebuffer_sink_counts_frames() {
        let mut sink = FramebufferSink::new(64, 32, 0x000000);
        sink.refresh(&scene()).unwrap();
        assert!(sink.frame().rows().flatten().any(|px| *px != crate::renderer::rgb(0)));

        sink.blank().unwrap();
        assert!(sink.frame().rows().flatten().all(|px| *px == crate::renderer::rgb(0)));
        assert_eq!(sink.refreshes(), 2);
    }

    #[test]
    fn test_terminal_sink_skips_duplicate_frames() {
        let mut out = Vec::new();
        {
            let mut sink = TerminalSink::new(FramebufferSink::new(64, 32, 0), &mut out);
            let scene = scene();
            sink.refresh(&scene).unwrap();
            sink.refresh(&scene).unwrap();
            sink.blank().unwrap();
        }
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("\x1b[H").count(), 2);
        assert!(text.contains('#'));
    }
}

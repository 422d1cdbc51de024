use crate::framebuffer::RgbImage;
use crate::input::QuitKeys;
use crate::machine::StopHandle;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::{debug, warn};
use std::collections::HashMap;
use std::io;
use tui::backend::{Backend, CrosstermBackend};
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders};
use tui::Terminal;

/// Display is handed a finished frame by the machine on every render. It
/// should abstract the implementation details, so a variety of kinds of
/// screen would work.
pub trait Display {
    /// show a complete frame
    fn present(&mut self, image: &RgbImage) -> Result<(), io::Error>;
}

// how many terminal cells we squash the image into
struct Resolution(usize, usize);

impl Resolution {
    fn cell_count(&self) -> usize {
        self.0 * self.1
    }

    fn x_bounds(&self) -> [f64; 2] {
        [0.0, (self.0 - 1) as f64]
    }

    fn y_bounds(&self) -> [f64; 2] {
        [-1.0 * (self.1 - 1) as f64, 0.0]
    }

    /// nearest-neighbour sample of the image, one point per cell
    fn samples_from_image<'a>(
        &self,
        image: &'a RgbImage,
    ) -> impl std::iter::Iterator<Item = (f64, f64, (u8, u8, u8))> + 'a {
        let (cols, rows) = (self.0, self.1);
        let mut count = self.cell_count();
        std::iter::from_fn(move || match count {
            0 => None,
            _ => {
                count -= 1;
                let (cx, cy) = (count % cols, count / cols);
                let px = cx * image.width / cols;
                let py = cy * image.height / rows;
                let rgb = image.get(px, py).unwrap_or((0, 0, 0));
                Some((
                    cx as f64,        // x
                    -1.0 * cy as f64, // y
                    rgb,
                ))
            }
        })
    }

    /// points bucketed by colour, so each colour is one draw call
    fn colour_planes(&self, image: &RgbImage) -> Vec<(Color, Vec<(f64, f64)>)> {
        let mut planes: HashMap<(u8, u8, u8), Vec<(f64, f64)>> = HashMap::new();
        for (x, y, rgb) in self.samples_from_image(image) {
            planes.entry(rgb).or_default().push((x, y));
        }
        planes
            .into_iter()
            .map(|((r, g, b), coords)| (Color::Rgb(r, g, b), coords))
            .collect()
    }
}

/// colour display in a terminal, rendered using TUI and Crossterm
///
/// `q` or Esc asks the machine to stop at the next instruction boundary.
pub struct TermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    resolution: Resolution,
    keys: QuitKeys,
    stop: StopHandle,
}

impl TermDisplay {
    pub fn new(cols: usize, rows: usize, stop: StopHandle) -> Result<TermDisplay, io::Error> {
        let keys = QuitKeys::new()?;
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        Ok(TermDisplay {
            terminal,
            resolution: Resolution(cols.max(1), rows.max(1)),
            keys,
            stop,
        })
    }
}

/// Draw one frame as a bordered canvas. The requested area is clamped to the
/// terminal, so a small window squashes the picture further.
fn draw_canvas<B: Backend>(
    terminal: &mut Terminal<B>,
    resolution: &Resolution,
    image: &RgbImage,
) -> Result<(), io::Error> {
    let planes = resolution.colour_planes(image);
    let (cols, rows) = (resolution.0, resolution.1);
    let x_bounds = resolution.x_bounds();
    let y_bounds = resolution.y_bounds();
    terminal.draw(|f| {
        let wanted = Rect::new(0, 0, 2 + cols as u16, 2 + rows as u16);
        let size = wanted.intersection(f.size());

        let canvas = Canvas::default()
            .block(
                Block::default()
                    .title("vm64")
                    .borders(Borders::ALL)
                    .style(Style::default().bg(Color::Black)),
            )
            .x_bounds(x_bounds)
            .y_bounds(y_bounds)
            .marker(Marker::Block)
            .paint(|ctx| {
                for (color, coords) in &planes {
                    ctx.draw(&Points {
                        coords,
                        color: *color,
                    });
                }
            });
        f.render_widget(canvas, size);
    })?;
    Ok(())
}

impl Display for TermDisplay {
    fn present(&mut self, image: &RgbImage) -> Result<(), io::Error> {
        draw_canvas(&mut self.terminal, &self.resolution, image)?;
        if self.keys.quit_requested()? {
            debug!("quit key pressed");
            self.stop.stop();
        }
        Ok(())
    }
}

/// Hands frames to another thread over a bounded queue. When the consumer
/// falls behind, new frames are dropped rather than blocking the machine.
pub struct QueueDisplay {
    tx: Sender<RgbImage>,
    dropped: u64,
}

impl QueueDisplay {
    pub fn new(capacity: usize) -> (QueueDisplay, Receiver<RgbImage>) {
        let (tx, rx) = bounded(capacity);
        (QueueDisplay { tx, dropped: 0 }, rx)
    }

    /// frames discarded because the queue was full
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl Display for QueueDisplay {
    fn present(&mut self, image: &RgbImage) -> Result<(), io::Error> {
        match self.tx.try_send(image.clone()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                warn!("display queue full, dropped frame ({} so far)", self.dropped);
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "display consumer has gone away",
            )),
        }
    }
}

/// useful for testing and headless runs
#[derive(Default)]
pub struct DummyDisplay {
    frames: usize,
    last: Option<RgbImage>,
}

impl DummyDisplay {
    pub fn new() -> DummyDisplay {
        DummyDisplay::default()
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn last_frame(&self) -> Option<&RgbImage> {
        self.last.as_ref()
    }
}

impl Display for DummyDisplay {
    fn present(&mut self, image: &RgbImage) -> Result<(), io::Error> {
        self.frames += 1;
        self.last = Some(image.clone());
        Ok(())
    }
}

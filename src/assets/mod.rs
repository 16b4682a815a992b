use std::{
    path::{Path, PathBuf},
    sync::mpsc::{self, Receiver, TryRecvError},
    thread,
};

use anyhow::{Context, Result};
use image::{RgbaImage, imageops::FilterType};

use crate::{config, render::Surface, types::Vec2};

enum State {
    Absent,
    Loading(Receiver<Result<RgbaImage>>),
    Ready(RgbaImage),
    Failed,
}

/// Backdrop image decoded off the frame thread. Drawing is a no-op until it is ready.
pub struct Background {
    state: State,
}

impl Background {
    pub fn none() -> Self {
        Self {
            state: State::Absent,
        }
    }

    #[cfg(test)]
    pub fn from_image(image: RgbaImage) -> Self {
        Self {
            state: State::Ready(image),
        }
    }

    pub fn load(path: PathBuf) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            // the receiver may already be gone if the app quit mid-load
            let _ = tx.send(decode(&path));
        });
        Self {
            state: State::Loading(rx),
        }
    }

    #[cfg(test)]
    pub fn is_ready(&self) -> bool {
        matches!(self.state, State::Ready(_))
    }

    #[cfg(test)]
    pub fn is_loading(&self) -> bool {
        matches!(self.state, State::Loading(_))
    }

    pub fn poll(&mut self) {
        let State::Loading(rx) = &self.state else {
            return;
        };
        self.state = match rx.try_recv() {
            Ok(Ok(image)) => {
                tracing::info!(
                    width = image.width(),
                    height = image.height(),
                    "background loaded"
                );
                State::Ready(image)
            }
            Ok(Err(err)) => {
                tracing::warn!("background unavailable: {err:#}");
                State::Failed
            }
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                tracing::warn!("background loader exited without a result");
                State::Failed
            }
        };
    }

    pub fn draw(&mut self, surface: &mut dyn Surface) {
        self.poll();
        if let State::Ready(image) = &self.state {
            let center = surface.bounds().center();
            let size = Vec2::new(config::BACKGROUND_SIZE, config::BACKGROUND_SIZE);
            surface.draw_image(image, center, size);
        }
    }
}

fn decode(path: &Path) -> Result<RgbaImage> {
    let side = config::BACKGROUND_SIZE as u32;
    let image =
        image::open(path).with_context(|| format!("failed to decode {}", path.display()))?;
    Ok(image.resize_exact(side, side, FilterType::Triangle).to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{render::FrameBuffer, types::Rgb};
    use image::Rgba;
    use std::time::{Duration, Instant};

    fn settle(background: &mut Background) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while background.is_loading() && Instant::now() < deadline {
            background.poll();
            thread::sleep(Duration::from_millis(5));
        }
    }

    mod draw {
        use super::*;

        #[test]
        fn absent_background_draws_nothing() {
            let mut fb = FrameBuffer::new(40, 20);
            Background::none().draw(&mut fb);
            assert_eq!(fb.get(20, 10).bg, None);
        }

        #[test]
        fn ready_background_is_centered() {
            let mut fb = FrameBuffer::new(100, 40);
            let mut background =
                Background::from_image(RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, 255])));
            background.draw(&mut fb);
            // canvas is 800 x 640, so the image spans x 250..550 and y 170..470
            assert_eq!(fb.get(50, 20).bg, Some(Rgb::new(1, 2, 3)));
            assert_eq!(fb.get(30, 20).bg, None);
            assert_eq!(fb.get(50, 5).bg, None);
        }
    }

    mod load {
        use super::*;

        #[test]
        fn missing_file_fails_quietly() {
            let mut fb = FrameBuffer::new(40, 20);
            let mut background = Background::load(PathBuf::from("/nonexistent/background.png"));
            settle(&mut background);
            assert!(!background.is_loading());
            assert!(!background.is_ready());
            background.draw(&mut fb);
            assert_eq!(fb.get(20, 10).bg, None);
        }

        #[test]
        fn decodes_png_from_disk() {
            let path = std::env::temp_dir()
                .join(format!("splitbounce-bg-{}.png", std::process::id()));
            RgbaImage::from_pixel(16, 16, Rgba([200, 100, 50, 255]))
                .save(&path)
                .expect("write test png");
            let mut background = Background::load(path.clone());
            settle(&mut background);
            let _ = std::fs::remove_file(&path);
            assert!(background.is_ready());
        }
    }
}

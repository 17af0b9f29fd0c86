// SPDX-License-Identifier: GPL-3.0-only

//! Terminal kiosk for the booth
//!
//! Renders camera preview, source image, result and QR code with Unicode
//! half-block characters (two vertical pixels per cell). The loop runs on
//! the calling thread; booth tasks run on the tokio runtime passed in and
//! report back over a channel.

use crate::app::{Booth, Message};
use crate::capture::CameraModalState;
use crate::backends::camera::CameraFrame;
use crate::constants::{timing, ui};
use crate::image_source::EncodedImage;
use crate::notifications::NotificationKind;
use crate::presenter::celebration::{ParticleShape, TerminalConfetti};
use crate::presenter::{QrNode, View};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph, Widget, Wrap},
};
use std::io::{self, stdout};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Run the kiosk until the user quits
pub fn run(
    booth: Booth,
    confetti: TerminalConfetti,
    runtime: &tokio::runtime::Handle,
) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, booth, confetti, runtime);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut booth: Booth,
    confetti: TerminalConfetti,
    runtime: &tokio::runtime::Handle,
) -> Result<(), Box<dyn std::error::Error>> {
    let (sender, mut receiver) = mpsc::unbounded_channel::<Message>();
    booth.init().spawn(runtime, &sender);

    let mut pictures = PictureCache::default();
    info!("Terminal booth started");

    loop {
        // Completed tasks first, so the frame reflects them
        while let Ok(message) = receiver.try_recv() {
            booth.update(message).spawn(runtime, &sender);
        }

        let now = Instant::now();
        booth.tick(now);
        confetti.step();

        terminal.draw(|f| draw(f, &booth, &confetti, &mut pictures, now))?;

        if event::poll(timing::UI_POLL_INTERVAL)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match key_to_action(&booth, key) {
                KeyAction::Quit => break,
                KeyAction::Send(message) => booth.update(message).spawn(runtime, &sender),
                KeyAction::Ignore => {}
            }
        }
    }

    // Dropping the booth releases a camera that may still be open
    drop(booth);
    info!("Terminal booth stopped");
    Ok(())
}

enum KeyAction {
    Quit,
    Send(Message),
    Ignore,
}

fn key_to_action(booth: &Booth, key: KeyEvent) -> KeyAction {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return KeyAction::Quit;
    }

    // The alert blocks everything until acknowledged
    if booth.alert().is_some() {
        return match key.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => {
                KeyAction::Send(Message::DismissAlert)
            }
            _ => KeyAction::Ignore,
        };
    }

    if booth.camera_state().is_open() {
        return match key.code {
            KeyCode::Char(' ') | KeyCode::Enter | KeyCode::Char('p') => {
                if booth.camera_state() == CameraModalState::Requesting {
                    KeyAction::Ignore
                } else {
                    KeyAction::Send(Message::StartCountdown)
                }
            }
            KeyCode::Esc | KeyCode::Char('q') => KeyAction::Send(Message::CloseCamera),
            _ => KeyAction::Ignore,
        };
    }

    let message = match key.code {
        KeyCode::Char('q') => return KeyAction::Quit,
        KeyCode::Char('c') => Message::OpenCamera,
        KeyCode::Char('u') => Message::PickUpload,
        KeyCode::Char('g') | KeyCode::Enter => Message::Generate,
        KeyCode::Char('r') | KeyCode::Delete | KeyCode::Backspace => Message::RemoveImage,
        KeyCode::Char('d') => Message::Download,
        KeyCode::Char('o') => Message::OpenDownload,
        KeyCode::Char('n') | KeyCode::Esc => Message::Reset,
        _ => return KeyAction::Ignore,
    };
    KeyAction::Send(message)
}

fn draw(
    f: &mut Frame<'_>,
    booth: &Booth,
    confetti: &TerminalConfetti,
    pictures: &mut PictureCache,
    now: Instant,
) {
    let [header, body, toast, status] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(f.area());

    f.render_widget(Paragraph::new(header_line(booth)), header);

    let camera = booth.camera_state();
    if camera.is_open() {
        draw_camera(f, booth, camera, body);
    } else if booth.presenter().view() == View::Result {
        draw_result(f, booth, pictures, body);
    } else {
        draw_form(f, booth, pictures, body, now);
    }

    if booth.is_generating() {
        draw_dialog(f, body, "Generating your photo...", Color::Rgb(ui::ACCENT.0, ui::ACCENT.1, ui::ACCENT.2));
    }

    f.render_widget(ConfettiWidget { confetti }, body);

    if let Some(notification) = booth.notifications().visible() {
        let color = match notification.kind {
            NotificationKind::Success => Color::Green,
            NotificationKind::Error => Color::Red,
        };
        f.render_widget(
            Paragraph::new(notification.message.as_str())
                .style(Style::default().fg(Color::Black).bg(color)),
            toast,
        );
    }

    if let Some(alert) = booth.alert() {
        draw_dialog(f, body, alert, Color::Red);
    }

    let message = status_message(booth);
    f.render_widget(StatusBar { message: &message }, status);
}

fn header_line(booth: &Booth) -> Line<'static> {
    let context = booth.context();
    let track = context
        .track
        .as_ref()
        .map_or_else(|| booth.config().default_track_phrase.clone(), |t| t.name.clone());
    Line::from(vec![
        Span::styled(
            " 🎓 Photobooth ",
            Style::default()
                .fg(Color::White)
                .bg(Color::Rgb(ui::ACCENT.0, ui::ACCENT.1, ui::ACCENT.2))
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" {} | {}", context.display_name, track)),
    ])
}

fn draw_camera(f: &mut Frame<'_>, booth: &Booth, state: CameraModalState, area: Rect) {
    let block = Block::bordered().title(" Camera ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let frame = booth.capture().preview_frame();
    let placeholder = match state {
        CameraModalState::Requesting => "Opening camera...",
        _ => "Waiting for camera...",
    };
    f.render_widget(
        FrameWidget {
            frame: frame.as_ref(),
            mirror: booth.config().mirror_preview,
            placeholder,
        },
        inner,
    );

    if let CameraModalState::Countdown(remaining) = state {
        let label = format!(" {} ", remaining);
        let x = inner.x + inner.width.saturating_sub(label.len() as u16) / 2;
        let y = inner.y + inner.height / 2;
        f.buffer_mut().set_string(
            x,
            y,
            label,
            Style::default()
                .fg(Color::White)
                .bg(Color::Rgb(ui::ACCENT.0, ui::ACCENT.1, ui::ACCENT.2))
                .add_modifier(Modifier::BOLD),
        );
    }
}

fn draw_form(
    f: &mut Frame<'_>,
    booth: &Booth,
    pictures: &mut PictureCache,
    area: Rect,
    now: Instant,
) {
    let prompt = booth.presenter().prompt_text();
    let [preview_area, prompt_area] = Layout::vertical([
        Constraint::Min(3),
        Constraint::Length(if prompt.is_empty() { 0 } else { 4 }),
    ])
    .areas(area);

    let mut block = Block::bordered().title(" Your photo ");
    if booth.is_highlighted(now) {
        block = block
            .border_style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
            .title(" An image is required ");
    }
    let inner = block.inner(preview_area);
    f.render_widget(block, preview_area);

    let source = booth.source();
    let frame = source
        .active()
        .and_then(|active| pictures.source(source.revision(), &active.image));
    f.render_widget(
        FrameWidget {
            frame,
            mirror: false,
            placeholder: "No image yet. Press 'c' for the camera or 'u' to upload.",
        },
        inner,
    );

    if !prompt.is_empty() {
        f.render_widget(
            Paragraph::new(prompt)
                .wrap(Wrap { trim: true })
                .style(Style::default().fg(Color::Rgb(ui::MUTED.0, ui::MUTED.1, ui::MUTED.2)))
                .block(Block::bordered().title(" Prompt ")),
            prompt_area,
        );
    }
}

fn draw_result(f: &mut Frame<'_>, booth: &Booth, pictures: &mut PictureCache, area: Rect) {
    let presenter = booth.presenter();
    let qr = presenter.qr_panel();
    let [image_area, qr_area] = Layout::horizontal([
        Constraint::Percentage(if qr.is_empty() { 100 } else { 62 }),
        Constraint::Percentage(if qr.is_empty() { 0 } else { 38 }),
    ])
    .areas(area);

    let block = Block::bordered().title(" Your graduation photo ");
    let inner = block.inner(image_area);
    f.render_widget(block, image_area);
    let frame = presenter
        .result()
        .and_then(|result| pictures.result(presenter.revision(), &result.image));
    f.render_widget(
        FrameWidget {
            frame,
            mirror: false,
            placeholder: "",
        },
        inner,
    );

    if qr.is_empty() {
        return;
    }

    let qr_block = Block::bordered().border_style(Style::default().fg(Color::Rgb(
        ui::ACCENT.0,
        ui::ACCENT.1,
        ui::ACCENT.2,
    )));
    let qr_inner = qr_block.inner(qr_area);
    f.render_widget(qr_block, qr_area);

    let [title_area, code_area, caption_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(4),
        Constraint::Length(3),
    ])
    .areas(qr_inner);

    for node in qr.nodes() {
        match node {
            QrNode::Title(title) => f.render_widget(
                Paragraph::new(title.as_str()).style(
                    Style::default()
                        .fg(Color::Rgb(ui::ACCENT.0, ui::ACCENT.1, ui::ACCENT.2))
                        .add_modifier(Modifier::BOLD),
                ),
                title_area,
            ),
            QrNode::Image(image) => {
                let frame = pictures.qr(presenter.revision(), image);
                f.render_widget(
                    FrameWidget {
                        frame,
                        mirror: false,
                        placeholder: "",
                    },
                    code_area,
                );
            }
            QrNode::Caption(caption) => {
                let mut lines = vec![Line::from(caption.as_str())];
                if let Some(payload) = qr.payload() {
                    lines.push(Line::from(Span::styled(
                        payload,
                        Style::default().add_modifier(Modifier::UNDERLINED),
                    )));
                }
                f.render_widget(
                    Paragraph::new(lines)
                        .wrap(Wrap { trim: true })
                        .style(Style::default().fg(Color::Rgb(ui::MUTED.0, ui::MUTED.1, ui::MUTED.2))),
                    caption_area,
                );
            }
        }
    }
}

fn draw_dialog(f: &mut Frame<'_>, area: Rect, text: &str, accent: Color) {
    let width = area.width.saturating_sub(4).min(64);
    let lines = text.lines().count() as u16 + (text.len() as u16 / width.max(1)) + 2;
    let height = lines.min(area.height);
    let dialog = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    };
    f.render_widget(Clear, dialog);
    f.render_widget(
        Paragraph::new(text)
            .wrap(Wrap { trim: false })
            .block(Block::bordered().border_style(Style::default().fg(accent))),
        dialog,
    );
}

fn status_message(booth: &Booth) -> String {
    if booth.alert().is_some() {
        return "Enter: OK".to_string();
    }
    match booth.camera_state() {
        CameraModalState::Requesting => return "Esc: cancel".to_string(),
        CameraModalState::Streaming => return "Space: take photo (countdown) | Esc: close".to_string(),
        CameraModalState::Countdown(_) => return "Space: restart countdown | Esc: close".to_string(),
        CameraModalState::Closed => {}
    }

    let mut msg = String::from("'c' camera | 'u' upload");
    if booth.source().is_valid() {
        msg.push_str(" | 'r' remove");
    }
    if booth.can_generate() {
        msg.push_str(" | 'g' generate");
    }
    if booth.presenter().result().is_some() {
        msg.push_str(" | 'd' download");
    }
    if booth.presenter().last_download().is_some() {
        msg.push_str(" | 'o' open");
    }
    msg.push_str(" | 'n' new | 'q' quit");
    msg
}

/// Decoded pictures for the views, keyed by revision so they decode once
#[derive(Default)]
struct PictureCache {
    source: Option<(u64, Option<CameraFrame>)>,
    result: Option<(u64, Option<CameraFrame>)>,
    qr: Option<(u64, Option<CameraFrame>)>,
}

impl PictureCache {
    fn source(&mut self, revision: u64, image: &EncodedImage) -> Option<&CameraFrame> {
        cached(&mut self.source, revision, image)
    }

    fn result(&mut self, revision: u64, image: &EncodedImage) -> Option<&CameraFrame> {
        cached(&mut self.result, revision, image)
    }

    fn qr(&mut self, revision: u64, image: &EncodedImage) -> Option<&CameraFrame> {
        cached(&mut self.qr, revision, image)
    }
}

fn cached<'a>(
    slot: &'a mut Option<(u64, Option<CameraFrame>)>,
    revision: u64,
    image: &EncodedImage,
) -> Option<&'a CameraFrame> {
    if slot.as_ref().is_none_or(|(key, _)| *key != revision) {
        *slot = Some((revision, picture_frame(image)));
    }
    slot.as_ref().and_then(|(_, frame)| frame.as_ref())
}

/// Decode for display, shrinking anything larger than the preview target
fn picture_frame(image: &EncodedImage) -> Option<CameraFrame> {
    let mut decoded = image.decode()?;
    let (width, height) = image.dimensions();
    if width * height > ui::PREVIEW_TARGET_PIXELS {
        let scale = (ui::PREVIEW_TARGET_PIXELS as f64 / (width * height) as f64).sqrt();
        decoded = decoded.thumbnail(
            ((width as f64 * scale) as u32).max(1),
            ((height as f64 * scale) as u32).max(1),
        );
    }
    let rgba = decoded.to_rgba8();
    let (w, h) = rgba.dimensions();
    debug!(width = w, height = h, "Decoded picture for display");
    Some(CameraFrame::from_rgba(w, h, rgba.into_raw()))
}

/// Widget that renders an RGBA frame using half-block characters
struct FrameWidget<'a> {
    frame: Option<&'a CameraFrame>,
    /// Flip horizontally (selfie preview)
    mirror: bool,
    placeholder: &'a str,
}

impl Widget for FrameWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = self.frame.filter(|f| f.width > 0 && f.height > 0) else {
            let x = area.x + (area.width.saturating_sub(self.placeholder.chars().count() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, self.placeholder, Style::default());
            }
            return;
        };
        if area.width == 0 || area.height == 0 {
            return;
        }

        // Each terminal cell displays 2 vertical pixels
        let frame_aspect = frame.width as f64 / frame.height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            let h = term_height;
            let w = h * frame_aspect;
            (w as u16, (h / 2.0) as u16)
        } else {
            let w = term_width;
            let h = w / frame_aspect;
            (w as u16, (h / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = frame.width as f64 / display_width as f64;
        let y_scale = frame.height as f64 / (display_height * 2) as f64;

        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;

                if term_x >= area.x + area.width || term_y >= area.y + area.height {
                    continue;
                }

                let column = if self.mirror {
                    display_width - 1 - tx
                } else {
                    tx
                };
                let src_x = (column as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                let (r, g, b) = frame.rgb_at(src_x, src_y_top);
                let top = Color::Rgb(r, g, b);
                let (r, g, b) = frame.rgb_at(src_x, src_y_bottom);
                let bottom = Color::Rgb(r, g, b);

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(top);
                    cell.set_bg(bottom);
                }
            }
        }
    }
}

/// Particles drawn on top of whatever is below
struct ConfettiWidget<'a> {
    confetti: &'a TerminalConfetti,
}

impl Widget for ConfettiWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for particle in self.confetti.particles() {
            if !(0.0..1.0).contains(&particle.x) || !(0.0..1.0).contains(&particle.y) {
                continue;
            }
            let x = area.x + (particle.x * area.width as f32) as u16;
            let y = area.y + (particle.y * area.height as f32) as u16;
            let (r, g, b) = particle.color;
            let style = Style::default().fg(Color::Rgb(r, g, b));
            match particle.shape {
                ParticleShape::Circle => {
                    if let Some(cell) = buf.cell_mut((x, y)) {
                        cell.set_char('●');
                        cell.set_style(style);
                    }
                }
                ParticleShape::Glyph(glyph) => {
                    if x + 1 < area.x + area.width {
                        buf.set_string(x, y, glyph, style);
                    }
                }
            }
        }
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(
            area.x,
            area.y,
            text,
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}

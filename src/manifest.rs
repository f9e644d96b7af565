use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use gif89::process::lzw::LzwStatus;
use gif89::structs::frame::Frame;
use gif89::structs::screen::ScreenDescriptor;
use gif89::utils::sub_block::BlockTerminator;

/// YAML summary written next to the decoded frames.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub version: String,
    pub source: String,
    pub screen: ScreenInfo,
    pub mode: String,
    pub format: String,
    #[serde(default)]
    pub frames: Vec<FrameInfo>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenInfo {
    pub width: u16,
    pub height: u16,
    pub background_index: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_colors: Option<usize>,
}

impl From<&ScreenDescriptor> for ScreenInfo {
    fn from(screen: &ScreenDescriptor) -> Self {
        Self {
            width: screen.width,
            height: screen.height,
            background_index: screen.background_index,
            global_colors: screen.global_table.as_ref().map(|t| t.len()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    Complete,
    Truncated,
    InvalidCode,
    TableOverflow,
}

impl From<LzwStatus> for Outcome {
    fn from(status: LzwStatus) -> Self {
        match status {
            LzwStatus::Complete(_) => Outcome::Complete,
            LzwStatus::Truncated(_) => Outcome::Truncated,
            LzwStatus::InvalidCode(_) => Outcome::InvalidCode,
            LzwStatus::TableOverflow(_) => Outcome::TableOverflow,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameInfo {
    pub index: usize,
    pub file: String,
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    pub interlaced: bool,
    pub colors: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparent_index: Option<u8>,
    pub outcome: Outcome,
    pub pixels_decoded: usize,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub trailing_bytes: usize,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unterminated: bool,
}

fn is_zero(v: &usize) -> bool {
    *v == 0
}

impl FrameInfo {
    pub fn new(frame: &Frame, file: &Path) -> Self {
        let (trailing_bytes, unterminated) = match frame.terminator {
            BlockTerminator::Clean => (0, false),
            BlockTerminator::TrailingData { skipped } => (skipped, false),
            BlockTerminator::Missing => (0, true),
        };

        Self {
            index: frame.index,
            file: file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            left: frame.left,
            top: frame.top,
            width: frame.width,
            height: frame.height,
            interlaced: frame.interlaced,
            colors: frame.palette.len(),
            transparent_index: frame.transparent_index,
            outcome: frame.status.into(),
            pixels_decoded: frame.status.produced(),
            trailing_bytes,
            unterminated,
        }
    }
}

impl Manifest {
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }
}

// src/pipeline/replay.rs
//
// JSONL replay of bus traffic. Each line is one record scheduled for a
// tick:
//
//   {"frame": 3, "service": "controlsState", "data": {"enabled": true, ...}}

use crate::messages::Message;
use anyhow::{Context, Result};
use std::fs;
use tracing::info;

#[derive(Debug, Clone)]
pub struct ReplayRecord {
    pub frame: u64,
    pub message: Message,
}

impl ReplayRecord {
    fn from_line(line: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(line)?;
        let frame = value
            .get("frame")
            .and_then(|f| f.as_u64())
            .context("missing frame number")?;
        // the envelope ignores the extra "frame" key
        let message: Message = serde_json::from_value(value)?;
        Ok(Self { frame, message })
    }
}

pub struct ReplayLog {
    records: Vec<ReplayRecord>,
    cursor: usize,
}

impl ReplayLog {
    pub fn load(path: &str) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("reading replay log {}", path))?;
        let log = Self::parse(&contents)?;
        info!("Loaded {} replay records from {}", log.records.len(), path);
        Ok(log)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let mut records = Vec::new();
        for (lineno, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let record = ReplayRecord::from_line(line)
                .with_context(|| format!("replay line {}", lineno + 1))?;
            records.push(record);
        }
        records.sort_by_key(|r| r.frame);
        Ok(Self { records, cursor: 0 })
    }

    /// Records due at or before `frame` that have not been handed out yet.
    pub fn due(&mut self, frame: u64) -> Vec<Message> {
        let start = self.cursor;
        while self.cursor < self.records.len() && self.records[self.cursor].frame <= frame {
            self.cursor += 1;
        }
        self.records[start..self.cursor]
            .iter()
            .map(|r| r.message.clone())
            .collect()
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.records.len()
    }

    pub fn last_frame(&self) -> u64 {
        self.records.last().map(|r| r.frame).unwrap_or(0)
    }
}

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::builder::BoardBuilder;
use crate::error::{HeyawakeError, Result};
use crate::location::Location;

/// One cell of a saved region. Only the region's anchor carries its clue.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TemplateCell {
    /// Column.
    pub x: usize,
    /// Row.
    pub y: usize,
    /// The region's clue, written on its anchor only.
    #[serde(default)]
    pub clue: Option<usize>,
}

/// One saved region.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TemplateRegion {
    /// Member cells, anchor first.
    pub cells: Vec<TemplateCell>,
}

impl TemplateRegion {
    /// The first clue found among the cells, if any.
    pub fn clue(&self) -> Option<usize> {
        self.cells.iter().find_map(|cell| cell.clue)
    }
}

/// A puzzle as saved to disk: a side length and a list of regions.
///
/// ```json
/// { "size": 4, "regions": [ { "cells": [ { "x": 0, "y": 0, "clue": 2 }, { "x": 0, "y": 1, "clue": null } ] } ] }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Side length.
    pub size: usize,
    /// Every region; together they must cover the grid exactly once.
    pub regions: Vec<TemplateRegion>,
}

impl Template {
    /// Capture `board` for saving.
    pub fn from_board(board: &Board) -> Self {
        let regions = board.regions().iter()
            .map(|region| TemplateRegion {
                cells: region.cells().iter()
                    .map(|cell| TemplateCell {
                        x: cell.0,
                        y: cell.1,
                        clue: region.clue().filter(|_| *cell == region.anchor()),
                    })
                    .collect_vec(),
            })
            .collect_vec();

        Self { size: board.size().get(), regions }
    }

    /// Replay this template into a fresh builder. Structural problems surface as the builder's invalid state.
    pub fn to_builder(&self) -> BoardBuilder {
        let mut builder = BoardBuilder::with_size(self.size);
        for region in &self.regions {
            let cells = region.cells.iter().map(|cell| Location(cell.x, cell.y)).collect_vec();
            builder.add_region(&cells, region.clue());
        }
        builder
    }

    /// Build the board this template describes.
    ///
    /// Fails if regions overlap, a region is empty, or the builder rejects the layout.
    pub fn to_board(&self) -> Result<Board> {
        if let Some(index) = self.regions.iter().position(|region| region.cells.is_empty()) {
            return Err(HeyawakeError::Template(format!("region {} has no cells", index)));
        }

        let builder = self.to_builder();
        if let Some(reasons) = builder.is_valid() {
            return Err(reasons.clone().into());
        }
        let listed: usize = self.regions.iter().map(|region| region.cells.len()).sum();
        let grouped: usize = builder.regions().iter().map(|region| region.cells().len()).sum();
        if grouped != listed {
            return Err(HeyawakeError::Template(format!("{} cell(s) are listed more than once", listed - grouped)));
        }

        Ok(builder.build()?)
    }

    /// Parse a template from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a template from the JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let template: Self = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        debug!("loaded {0}x{0} template with {1} regions from {2}", template.size, template.regions.len(), path.display());
        Ok(template)
    }

    /// Write this template to `path` as JSON, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        debug!("saved template to {}", path.display());
        Ok(())
    }
}

use crate::{
    codec::{
        RowCodec,
        frame::{FRAME_PREFIX_BYTES, FrameLayout, FrameReader},
        record::{RECORD_TAG_BYTES, RecordWriter},
    },
    error::{ErrorOrigin, InternalError},
    join::{JoinEngine, UpperBound},
    model::{
        record::{JoinRecord, TableSide},
        schema::{ColumnDef, Schema},
    },
    obs::{self, JoinOp, OpOutcome},
};

///
/// SideShapes
///
/// Schema each input side's rows must follow for one preprocess call.
/// `None` only for an empty side under sampled bounds.
///

struct SideShapes {
    primary: Option<Schema>,
    foreign: Option<Schema>,
}

impl SideShapes {
    const fn for_side(&self, side: TableSide) -> Option<&Schema> {
        match side {
            TableSide::Primary => self.primary.as_ref(),
            TableSide::Foreign => self.foreign.as_ref(),
        }
    }
}

impl<C: RowCodec> JoinEngine<C> {
    /// Fixed frame width every record written by [`Self::preprocess`] will use.
    pub fn preprocess_frame_width(
        &self,
        primary_rows: &[u8],
        num_primary: u32,
        foreign_rows: &[u8],
        num_foreign: u32,
    ) -> Result<usize, InternalError> {
        let shapes = self.side_shapes(primary_rows, num_primary, foreign_rows, num_foreign)?;

        self.frame_width_for(&shapes)
    }

    /// Exact output length of [`Self::preprocess`] for these inputs.
    pub fn preprocess_output_len(
        &self,
        primary_rows: &[u8],
        num_primary: u32,
        foreign_rows: &[u8],
        num_foreign: u32,
    ) -> Result<usize, InternalError> {
        let width =
            self.preprocess_frame_width(primary_rows, num_primary, foreign_rows, num_foreign)?;
        let frames = num_primary as usize + num_foreign as usize;

        FrameLayout::Fixed(width).stream_len(frames).ok_or_else(|| {
            InternalError::capacity(ErrorOrigin::Preprocess, "preprocess output length overflows")
        })
    }

    /// Tag raw primary and foreign rows as join records of one fixed width.
    ///
    /// Writes all `num_primary` primary records followed by all `num_foreign`
    /// foreign records and returns the number of bytes written. The width
    /// depends only on row shapes, never on row contents.
    pub fn preprocess(
        &self,
        primary_rows: &[u8],
        num_primary: u32,
        foreign_rows: &[u8],
        num_foreign: u32,
        out: &mut [u8],
    ) -> Result<usize, InternalError> {
        let rows_in = num_primary.saturating_add(num_foreign);

        obs::observe(self.trace, JoinOp::Preprocess, None, rows_in, || {
            self.check_row_count(
                ErrorOrigin::Preprocess,
                u64::from(num_primary) + u64::from(num_foreign),
            )?;

            let shapes = self.side_shapes(primary_rows, num_primary, foreign_rows, num_foreign)?;
            let width = self.frame_width_for(&shapes)?;

            let mut writer = RecordWriter::new(&self.codec, out, FrameLayout::Fixed(width))?;
            for (side, input, count) in [
                (TableSide::Primary, primary_rows, num_primary),
                (TableSide::Foreign, foreign_rows, num_foreign),
            ] {
                // an empty side may arrive as an empty buffer
                if count == 0 {
                    continue;
                }
                let schema = shapes.for_side(side);
                let mut frames = FrameReader::new(input)?;

                for _ in 0..count {
                    let row = self.codec.decode_row(frames.next_payload()?)?;
                    if let Some(schema) = schema {
                        schema.check_row(&row).map_err(|err| {
                            InternalError::precondition(ErrorOrigin::Preprocess, err.to_string())
                        })?;
                    }

                    writer.write_join(&JoinRecord::Real { side, row })?;
                }
            }

            let frames = writer.frames_written();
            let written = writer.finish();

            Ok((written, OpOutcome::new(frames, written)))
        })
    }

    // Resolve the row shape of each side.
    //
    // Sampled bounds take the shape of each side's first row; every later
    // row must match it so the sampled width bounds the whole input.
    fn side_shapes(
        &self,
        primary_rows: &[u8],
        num_primary: u32,
        foreign_rows: &[u8],
        num_foreign: u32,
    ) -> Result<SideShapes, InternalError> {
        match &self.upper_bound {
            UpperBound::Schema { primary, foreign } => Ok(SideShapes {
                primary: Some(primary.clone()),
                foreign: Some(foreign.clone()),
            }),
            UpperBound::Sample => {
                if num_primary == 0 && num_foreign == 0 {
                    return Err(InternalError::precondition(
                        ErrorOrigin::Preprocess,
                        "cannot size join records from two empty inputs; configure schema upper bounds",
                    ));
                }

                Ok(SideShapes {
                    primary: self.sample_shape("primary", primary_rows, num_primary)?,
                    foreign: self.sample_shape("foreign", foreign_rows, num_foreign)?,
                })
            }
        }
    }

    fn sample_shape(
        &self,
        name: &str,
        input: &[u8],
        count: u32,
    ) -> Result<Option<Schema>, InternalError> {
        if count == 0 {
            return Ok(None);
        }

        let payload = FrameReader::new(input)?.next_payload()?;
        let row = self.codec.decode_row(payload)?;
        let columns = row
            .kinds()
            .into_iter()
            .enumerate()
            .map(|(idx, kind)| ColumnDef::new(format!("c{idx}"), kind))
            .collect();

        Ok(Some(Schema::new(format!("sampled {name}"), columns)))
    }

    fn frame_width_for(&self, shapes: &SideShapes) -> Result<usize, InternalError> {
        let payload = [shapes.primary.as_ref(), shapes.foreign.as_ref()]
            .into_iter()
            .flatten()
            .map(|schema| RECORD_TAG_BYTES + schema.max_encoded_size(&self.codec))
            .max()
            .unwrap_or_default();

        let width = payload + FRAME_PREFIX_BYTES;
        self.check_frame_width(ErrorOrigin::Preprocess, width)?;

        Ok(width)
    }
}

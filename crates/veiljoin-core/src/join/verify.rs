use crate::{
    codec::{RowCodec, record::RecordReader},
    error::{ErrorOrigin, InternalError},
    join::{
        JoinEngine,
        policy::{JoinAttribute, JoinPolicy},
    },
    model::record::JoinRecord,
};

impl<C: RowCodec> JoinEngine<C> {
    /// Check that a join-record stream is ordered by join attribute with
    /// primary records ahead of foreign records within each attribute.
    ///
    /// Dummy records are ignored. Merges run this automatically when sort
    /// verification is enabled; it is not an oblivious pass.
    pub fn verify_sorted<P: JoinPolicy + ?Sized>(
        &self,
        policy: &P,
        input: &[u8],
        num_rows: u32,
    ) -> Result<(), InternalError> {
        let mut prev: Option<(JoinAttribute, u8)> = None;

        for (pos, record) in RecordReader::new(&self.codec, input, num_rows)?.enumerate() {
            let JoinRecord::Real { side, row } = record? else {
                continue;
            };
            let key = (policy.join_attribute(side, &row)?, side.group_rank());

            if prev.as_ref().is_some_and(|prev| *prev > key) {
                return Err(InternalError::precondition(
                    ErrorOrigin::Merge,
                    format!("join-record stream is not sorted at record {pos}"),
                ));
            }
            prev = Some(key);
        }

        Ok(())
    }
}

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeParseError {
    #[error("empty block in range expression '{0}'")]
    EmptyBlock(String),
    #[error("invalid number '{0}' in range expression")]
    InvalidNumber(String),
    #[error("malformed range block '{0}'")]
    MalformedBlock(String),
}

/// Parses a 1-based selection expression into the selected indices.
///
/// The expression is a comma-separated list of blocks, each of which is a
/// single index (`"3"`), an inclusive span (`"2-5"` or `"2:5"`), or a
/// strided span (`"1:2:9"`, meaning start:stride:end). Indices are returned
/// in expression order; duplicates are kept.
pub fn parse_range(expression: &str) -> Result<Vec<usize>, RangeParseError> {
    let mut selection = Vec::new();
    for block in expression.split(',') {
        let block = block.trim();
        if block.is_empty() {
            return Err(RangeParseError::EmptyBlock(expression.to_string()));
        }

        let parts: Vec<&str> = if block.contains(':') {
            block.split(':').collect()
        } else {
            block.split('-').collect()
        };

        let numbers: Vec<usize> = parts
            .iter()
            .map(|part| {
                let part = part.trim();
                part.parse::<usize>()
                    .map_err(|_| RangeParseError::InvalidNumber(part.to_string()))
            })
            .collect::<Result<_, _>>()?;

        match numbers.as_slice() {
            [single] => selection.push(*single),
            [first, last] if first <= last => selection.extend(*first..=*last),
            [first, stride, last] if first <= last && *stride > 0 => {
                selection.extend((*first..=*last).step_by(*stride));
            }
            _ => return Err(RangeParseError::MalformedBlock(block.to_string())),
        }
    }
    Ok(selection)
}

use crate::error::StoreError;

/// Exact nearest-neighbour index over flat, row-major vectors
#[derive(Debug, Clone, PartialEq)]
pub struct FlatL2Index {
  dimension: usize,
  vectors: Vec<f32>,
}

impl FlatL2Index {
  pub fn new(dimension: usize) -> Self {
    Self { dimension, vectors: Vec::new() }
  }

  pub fn from_embeddings(dimension: usize, embeddings: &[Vec<f32>]) -> Result<Self, StoreError> {
    let mut index = Self::new(dimension);
    for embedding in embeddings {
      index.add(embedding)?;
    }
    Ok(index)
  }

  pub fn add(&mut self, vector: &[f32]) -> Result<(), StoreError> {
    self.check_dimension(vector)?;
    self.vectors.extend_from_slice(vector);
    Ok(())
  }

  pub fn dimension(&self) -> usize {
    self.dimension
  }

  pub fn len(&self) -> usize {
    if self.dimension == 0 {
      0
    } else {
      self.vectors.len() / self.dimension
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Stored vectors in insertion order
  pub fn rows(&self) -> std::slice::ChunksExact<'_, f32> {
    // dimension 0 holds no rows
    self.vectors.chunks_exact(self.dimension.max(1))
  }

  /// Up to `k` `(position, squared L2 distance)` pairs, nearest first; ties keep insertion order
  pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, StoreError> {
    self.check_dimension(query)?;
    if self.dimension == 0 {
      return Ok(vec![]);
    }

    let mut hits: Vec<(usize, f32)> = self
      .rows()
      .map(|row| squared_l2(row, query))
      .enumerate()
      .collect();

    hits.sort_by(|a, b| a.1.total_cmp(&b.1));
    hits.truncate(k);
    Ok(hits)
  }

  fn check_dimension(&self, vector: &[f32]) -> Result<(), StoreError> {
    if vector.len() != self.dimension {
      return Err(StoreError::DimensionMismatch { expected: self.dimension, found: vector.len() });
    }
    Ok(())
  }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
  a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

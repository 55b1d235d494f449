use nalgebra::{Point, SVector};

use crate::bounding_hierarchy::BvhValue;

/// An axis-aligned bounding box over `D` dimensions.
///
/// A default-constructed box is *empty* (`min = +inf`, `max = -inf`); growing
/// an empty box by one point makes the box degenerate to that point. Every
/// containment query on an empty box is vacuously false.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb<T: BvhValue, const D: usize> {
    /// Minimum coordinates.
    pub min: Point<T, D>,
    /// Maximum coordinates.
    pub max: Point<T, D>,
}

/// A trait implemented by things which can be bounded by an [`Aabb`].
pub trait Bounded<T: BvhValue, const D: usize> {
    /// Returns the box bounding `self`.
    fn aabb(&self) -> Aabb<T, D>;
}

impl<T: BvhValue, const D: usize> Aabb<T, D> {
    /// Creates a new [`Aabb`] with the given bounds.
    ///
    /// Debug-asserts `min[i] <= max[i]` on every axis.
    pub fn with_bounds(min: Point<T, D>, max: Point<T, D>) -> Self {
        debug_assert!((0..D).all(|i| min[i] <= max[i]));
        Self { min, max }
    }

    /// Creates a new empty [`Aabb`].
    pub fn empty() -> Self {
        Self {
            min: SVector::<T, D>::repeat(T::infinity()).into(),
            max: SVector::<T, D>::repeat(T::neg_infinity()).into(),
        }
    }

    /// Returns `true` if this box contains no point, i.e. `min > max` on
    /// some axis. A box degenerated to a single point is not empty.
    pub fn is_empty(&self) -> bool {
        (0..D).any(|i| self.min[i] > self.max[i])
    }

    /// Returns a new box grown to include `p`.
    pub fn grow(mut self, p: &Point<T, D>) -> Self {
        self.grow_mut(p);
        self
    }

    /// Grows this box to include `p`.
    pub fn grow_mut(&mut self, p: &Point<T, D>) {
        for i in 0..D {
            self.min[i] = self.min[i].min(p[i]);
            self.max[i] = self.max[i].max(p[i]);
        }
    }

    /// Returns the smallest box containing both `self` and `other`.
    pub fn join(mut self, other: &Self) -> Self {
        self.join_mut(other);
        self
    }

    /// Unions `other` into this box.
    pub fn join_mut(&mut self, other: &Self) {
        for i in 0..D {
            self.min[i] = self.min[i].min(other.min[i]);
            self.max[i] = self.max[i].max(other.max[i]);
        }
    }

    /// Returns `true` if `p` is inside this box (borders included).
    pub fn contains(&self, p: &Point<T, D>) -> bool {
        (0..D).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }

    /// Returns `true` if `p` is inside this box up to `epsilon` per axis.
    pub fn approx_contains_eps(&self, p: &Point<T, D>, epsilon: T) -> bool {
        (0..D).all(|i| p[i] - self.min[i] > -epsilon && p[i] - self.max[i] < epsilon)
    }

    /// Returns `true` if `other` lies entirely inside this box.
    pub fn contains_aabb(&self, other: &Self) -> bool {
        (0..D).all(|i| other.min[i] >= self.min[i] && other.max[i] <= self.max[i])
    }

    /// Returns the size of this box on every axis.
    pub fn size(&self) -> SVector<T, D> {
        self.max - self.min
    }

    /// Returns the center point of this box.
    ///
    /// Meaningless on an empty box.
    pub fn center(&self) -> Point<T, D> {
        self.min + self.size() * T::from_f32(0.5).unwrap()
    }

    /// Returns the total surface area of this box, generalized to `D`
    /// dimensions as twice the sum of pairwise extent products.
    pub fn surface_area(&self) -> T {
        let size = self.size();
        let mut total = T::zero();
        for i in 0..D {
            for j in (i + 1)..D {
                total = total + size[i] * size[j];
            }
        }
        T::from_f32(2.0).unwrap() * total
    }

    /// Returns the axis along which this box is stretched the most.
    pub fn largest_axis(&self) -> usize {
        let size = self.size();
        let mut axis = 0;
        for i in 1..D {
            if size[i] > size[axis] {
                axis = i;
            }
        }
        axis
    }
}

impl<T: BvhValue, const D: usize> Default for Aabb<T, D> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: BvhValue, const D: usize> Bounded<T, D> for Aabb<T, D> {
    fn aabb(&self) -> Aabb<T, D> {
        *self
    }
}

impl<T: BvhValue, const D: usize> Bounded<T, D> for Point<T, D> {
    fn aabb(&self) -> Aabb<T, D> {
        Aabb::with_bounds(*self, *self)
    }
}

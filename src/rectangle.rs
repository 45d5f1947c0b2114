//! Single-rectangle evaluation.

/// A function the area is computed under.
///
/// Any pure `Fn(f64) -> f64` that can be shared between threads qualifies.
pub trait Integrand: Fn(f64) -> f64 + Sync {}

impl<F> Integrand for F where F: Fn(f64) -> f64 + Sync {}

/// Reference integrand, `f(x) = x²`.
pub fn square(x: f64) -> f64 {
    x * x
}

/// One rectangle of a left Riemann sum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    /// Left edge, where the integrand is sampled
    pub left_x: f64,
    /// Signed width
    pub width: f64,
    /// Integrand value at `left_x`
    pub height: f64,
    /// `width * height`
    pub area: f64,
}

impl Rectangle {
    /// Evaluate the rectangle with local index `index` of a share starting at
    /// `local_left`.
    #[inline]
    pub fn evaluate<F: Integrand + ?Sized>(local_left: f64, width: f64, index: u64, f: &F) -> Self {
        let left_x = local_left + index as f64 * width;
        let height = f(left_x);
        Rectangle {
            left_x,
            width,
            height,
            area: width * height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_the_left_edge() {
        let r = Rectangle::evaluate(0.0, 1.0, 3, &square);
        assert_eq!(r.left_x, 3.0);
        assert_eq!(r.height, 9.0);
        assert_eq!(r.area, 9.0);
    }

    #[test]
    fn area_scales_with_width() {
        let r = Rectangle::evaluate(2.0, 0.5, 2, &|x: f64| x + 1.0);
        assert_eq!(r.left_x, 3.0);
        assert_eq!(r.height, 4.0);
        assert_eq!(r.area, 2.0);
    }

    #[test]
    fn negative_width_gives_negative_area() {
        let r = Rectangle::evaluate(2.0, -1.0, 0, &square);
        assert_eq!(r.area, -4.0);
    }
}

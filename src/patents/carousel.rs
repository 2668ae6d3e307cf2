//! Image carousel state.
//!
//! The rendered page navigates in the browser (`moveSlide`); the Rust
//! side decides which slide starts active and whether controls appear.
//! `move_slide` mirrors the script's arithmetic for tests.

/// Index into `len` images with wrap-around navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Carousel {
    len: usize,
    index: usize,
}

impl Carousel {
    pub fn new(len: usize) -> Self {
        Self { len, index: 0 }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Previous/next controls are only shown for two or more images.
    pub fn shows_controls(&self) -> bool {
        self.len > 1
    }

    /// Move by `step` slides, wrapping modulo the image count.
    #[cfg(test)]
    pub fn move_slide(&mut self, step: isize) -> usize {
        if self.len == 0 {
            return 0;
        }
        let len = self.len as isize;
        self.index = (self.index as isize + step).rem_euclid(len) as usize;
        self.index
    }
}

/// Wrap-around slide navigation for the rendered page.
pub const CAROUSEL_SCRIPT: &str = r#"<script>
(function () {
  var slides = document.querySelectorAll(".carousel-slide");
  var counter = document.getElementById("carousel-counter");
  var index = 0;
  function show(next) {
    if (slides.length === 0) { return; }
    slides[index].classList.remove("active");
    index = ((next % slides.length) + slides.length) % slides.length;
    slides[index].classList.add("active");
    if (counter) { counter.textContent = (index + 1) + " / " + slides.length; }
  }
  window.moveSlide = function (step) { show(index + step); };
})();
</script>"#;

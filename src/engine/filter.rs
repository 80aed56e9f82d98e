/// Common trait for streaming filters
///
/// Implemented by the folded engine and by the floating and direct-form
/// reference filters so validation can drive any of them the same way.
pub trait SampleFilter {
    type Sample: Copy;

    /// Process a single sample (one clock edge)
    fn process(&mut self, sample: Self::Sample) -> Self::Sample;

    /// Process a buffer of samples in-place
    fn process_buffer(&mut self, buffer: &mut [Self::Sample]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Filter a slice into a new vector
    fn filter(&mut self, input: &[Self::Sample]) -> Vec<Self::Sample> {
        let mut output = input.to_vec();
        self.process_buffer(&mut output);
        output
    }
}

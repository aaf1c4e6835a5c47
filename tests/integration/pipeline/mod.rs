mod test_band_streaming;
mod test_reference_resize;

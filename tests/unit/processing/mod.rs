mod test_convert_job;
mod test_frame_pool;

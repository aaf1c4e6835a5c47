mod test_convert_file;

mod test_lod_basic;

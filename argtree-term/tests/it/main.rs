mod passwd;

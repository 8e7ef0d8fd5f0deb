use serde_json::Value;
use std::collections::HashMap;
use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

///json格式的配置文件
pub struct Conf {
    conf: HashMap<String, Value>,
}

impl Conf {
    ///初始化配置文件
    pub fn init(path: &str) -> Conf {
        let conf = read_conf_from_file(path);
        match conf {
            Ok(conf) => Conf { conf },
            Err(e) => panic!("read conf file {} failed! {:?}", path, e),
        }
    }

    ///拿整数,没有配置返回0
    pub fn get_usize(&self, key: &str) -> usize {
        let value = self.conf.get(key);
        if value.is_none() {
            return 0;
        }
        value.unwrap().as_i64().unwrap_or(0) as usize
    }

    ///拿字符切片,没有配置返回空串
    pub fn get_str(&self, key: &str) -> &str {
        let value = self.conf.get(key);
        if value.is_none() {
            return "";
        }
        value.unwrap().as_str().unwrap_or("")
    }
}

///读取配置文件
fn read_conf_from_file<P: AsRef<Path>>(path: P) -> Result<HashMap<String, Value>, Box<dyn Error>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let map = serde_json::from_reader(reader)?;
    Ok(map)
}

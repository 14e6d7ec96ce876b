use std::time::{Duration, SystemTime};

use objc2::rc::Retained;
use objc2::runtime::AnyObject;
use objc2_foundation::{NSData, NSDate, NSDictionary, NSNumber, NSString};

use crate::now_playing::InfoDictionary;

trait NSDictionaryLookup {
    fn object_for_str(&self, key: &str) -> Option<Retained<AnyObject>>;
}

impl NSDictionaryLookup for NSDictionary<NSString, AnyObject> {
    fn object_for_str(&self, key: &str) -> Option<Retained<AnyObject>> {
        self.objectForKey(&NSString::from_str(key))
    }
}

impl InfoDictionary for NSDictionary<NSString, AnyObject> {
    fn get_string_for_key(&self, key: &str) -> Option<String> {
        let value = self.object_for_str(key)?;
        value.downcast_ref::<NSString>().map(|x| x.to_string())
    }

    fn get_f64_for_key(&self, key: &str) -> Option<f64> {
        let value = self.object_for_str(key)?;
        value.downcast_ref::<NSNumber>().map(|x| x.as_f64())
    }

    fn get_bool_for_key(&self, key: &str) -> Option<bool> {
        let value = self.object_for_str(key)?;
        value.downcast_ref::<NSNumber>().map(|x| x.as_bool())
    }

    fn get_data_for_key(&self, key: &str) -> Option<Vec<u8>> {
        let value = self.object_for_str(key)?;
        value.downcast_ref::<NSData>().map(|x| x.to_vec())
    }

    fn get_date_for_key(&self, key: &str) -> Option<SystemTime> {
        let value = self.object_for_str(key)?;
        let seconds = value.downcast_ref::<NSDate>()?.timeIntervalSince1970();

        if seconds.is_finite() && seconds >= 0f64 {
            Some(SystemTime::UNIX_EPOCH + Duration::from_secs_f64(seconds))
        } else {
            None
        }
    }
}
